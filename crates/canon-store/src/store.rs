use std::collections::HashMap;
use std::fmt;

use canon_audit::{AuditLog, AuditRecord};
use canon_crypto::{hash_fact, sha256_hex};
use canon_types::{
    AuditAction, AuditEntry, CanonError, CanonErrorCode, CanonResult, Clock, Confidence, Conflict,
    ConflictResolution, ContentHash, Fact, FactInput, FactKey, FactMetadata, FactPatch,
    FactSource, FactStatus, FactType, ResolutionChoice, SystemClock,
};
use chrono::{DateTime, Utc};

use crate::config::CanonConfig;
use crate::resolver::{self, Outcome};
use crate::validate::{ensure_capacity, ensure_version, validate_input, validate_value};

const DEFAULT_ACTOR: &str = "system";

/// The authoritative fact store.
///
/// Facts are kept in an append-only table in creation order. Every created
/// fact is chained to the one before it through `previous_hash`, and every
/// mutation is recorded in a separately chained audit log. Reads never
/// mutate; mutations take `&mut self`.
pub struct CanonStore {
    pub(crate) config: CanonConfig,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) facts: Vec<Fact>,
    pub(crate) by_id: HashMap<String, usize>,
    /// Every record of a lineage, oldest first.
    pub(crate) lineages: HashMap<FactKey, Vec<usize>>,
    /// The single ACTIVE record of each key, if any.
    pub(crate) active: HashMap<FactKey, usize>,
    pub(crate) conflicts: Vec<Conflict>,
    pub(crate) conflict_index: HashMap<String, usize>,
    pub(crate) audit: AuditLog,
    /// Tip of the fact chain.
    pub(crate) last_hash: ContentHash,
}

/// Everything about a new fact except its position in the chain.
pub(crate) struct FactDraft {
    pub fact_type: FactType,
    pub subject: String,
    pub predicate: String,
    pub value: String,
    pub source: FactSource,
    pub confidence: Confidence,
    pub metadata: FactMetadata,
}

impl FactDraft {
    fn from_input(input: &FactInput) -> Self {
        Self {
            fact_type: input.fact_type,
            subject: input.subject.clone(),
            predicate: input.predicate.clone(),
            value: input.value.clone(),
            source: input.source,
            confidence: input.effective_confidence(),
            metadata: FactMetadata {
                created_by: actor_of(input.created_by.as_deref()).to_string(),
                source_ref: input.source_ref.clone(),
                source_position: input.source_position.clone(),
                tags: input.tags.clone(),
                notes: input.notes.clone(),
            },
        }
    }

    fn key(&self) -> FactKey {
        FactKey::new(&self.subject, &self.predicate)
    }
}

impl CanonStore {
    /// An empty store with default limits and the system clock.
    pub fn new() -> Self {
        Self::with_config(CanonConfig::default(), SystemClock)
    }

    /// An empty store reading time from `clock`.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self::with_config(CanonConfig::default(), clock)
    }

    pub fn with_config(config: CanonConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Box::new(clock),
            facts: Vec::new(),
            by_id: HashMap::new(),
            lineages: HashMap::new(),
            active: HashMap::new(),
            conflicts: Vec::new(),
            conflict_index: HashMap::new(),
            audit: AuditLog::new(),
            last_hash: ContentHash::genesis(),
        }
    }

    pub fn config(&self) -> &CanonConfig {
        &self.config
    }

    /// Hash of the most recently created fact, genesis when empty.
    pub fn last_hash(&self) -> &ContentHash {
        &self.last_hash
    }

    /// Record a claim, settling it against the current ACTIVE fact by source
    /// priority.
    ///
    /// Returns the fact that wins the key afterwards. An equal-priority claim
    /// with a different value opens a conflict and fails with
    /// `CONFLICT_UNRESOLVED` carrying the conflict id.
    pub fn add(&mut self, input: FactInput) -> CanonResult<Fact> {
        validate_input(&self.config, &input, self.facts.len())?;
        let now = self.clock.now();
        let actor = actor_of(input.created_by.as_deref()).to_string();

        let Some(existing) = self.active.get(&input.key()).copied() else {
            let index = self.create(FactDraft::from_input(&input), now)?;
            let fact_id = self.facts[index].id.clone();
            self.audit
                .append(AuditRecord::new(AuditAction::Create, fact_id, actor, now))?;
            return Ok(self.facts[index].clone());
        };

        match resolver::compare(&self.facts[existing], &input) {
            Outcome::Same => Ok(self.facts[existing].clone()),
            Outcome::Keep => {
                tracing::debug!(
                    fact = %self.facts[existing].id,
                    source = %input.source,
                    "lower-priority claim ignored"
                );
                Ok(self.facts[existing].clone())
            }
            Outcome::Supersede => {
                let previous_id = self.facts[existing].id.clone();
                let index = self.supersede(existing, FactDraft::from_input(&input), &actor, now, None)?;
                let record = AuditRecord::new(AuditAction::Update, self.facts[index].id.clone(), actor, now)
                    .detail("previousId", previous_id)
                    .detail("reason", "higher priority source");
                self.audit.append(record)?;
                Ok(self.facts[index].clone())
            }
            Outcome::Conflict => Err(self.open_conflict(existing, input, now)),
        }
    }

    /// Replace the value of the ACTIVE fact for a key with a new version.
    ///
    /// Unlike [`add`](Self::add), no priority check is made. The new version
    /// keeps the type and metadata of the fact it replaces.
    pub fn update(&mut self, subject: &str, predicate: &str, patch: FactPatch) -> CanonResult<Fact> {
        validate_value(&self.config, &patch.value)?;
        ensure_capacity(&self.config, self.facts.len())?;
        let key = FactKey::new(subject, predicate);
        let existing = self
            .active
            .get(&key)
            .copied()
            .ok_or_else(|| CanonError::fact_not_found(subject, predicate))?;

        let now = self.clock.now();
        let actor = actor_of(patch.updated_by.as_deref()).to_string();
        let current = &self.facts[existing];
        let source = patch.source.unwrap_or(current.source);
        let mut metadata = current.metadata.clone();
        if let Some(reason) = &patch.reason {
            metadata.notes = Some(reason.clone());
        }
        let draft = FactDraft {
            fact_type: current.fact_type,
            subject: current.subject.clone(),
            predicate: current.predicate.clone(),
            value: patch.value.clone(),
            source,
            confidence: patch.confidence.unwrap_or_else(|| source.default_confidence()),
            metadata,
        };
        let previous_id = current.id.clone();
        let previous_value = current.value.clone();

        let index = self.supersede(existing, draft, &actor, now, None)?;
        let mut record = AuditRecord::new(AuditAction::Update, self.facts[index].id.clone(), actor, now)
            .detail("previousId", previous_id)
            .detail("previousValue", previous_value)
            .detail("newValue", patch.value);
        if let Some(reason) = patch.reason {
            record = record.detail("reason", reason);
        }
        self.audit.append(record)?;
        Ok(self.facts[index].clone())
    }

    /// Soft-delete the ACTIVE fact for a key. The record is kept forever.
    ///
    /// Returns the deleted record; a key with no ACTIVE fact fails with
    /// `FACT_NOT_FOUND`. `deleted_by` defaults to `system`.
    pub fn delete(
        &mut self,
        subject: &str,
        predicate: &str,
        deleted_by: Option<&str>,
        reason: Option<&str>,
    ) -> CanonResult<Fact> {
        let key = FactKey::new(subject, predicate);
        let index = self
            .active
            .get(&key)
            .copied()
            .ok_or_else(|| CanonError::fact_not_found(subject, predicate))?;

        let now = self.clock.now();
        let actor = actor_of(deleted_by);
        self.set_status(index, FactStatus::Deleted);
        self.close_conflicts(index, actor, now, None);
        let mut record = AuditRecord::new(
            AuditAction::Delete,
            self.facts[index].id.clone(),
            actor,
            now,
        );
        if let Some(reason) = reason {
            record = record.detail("reason", reason);
        }
        self.audit.append(record)?;

        tracing::debug!(fact = %self.facts[index].id, key = %key, "fact deleted");
        Ok(self.facts[index].clone())
    }

    /// Conflicts still waiting for a resolution, in detection order.
    pub fn pending_conflicts(&self) -> Vec<&Conflict> {
        self.conflicts.iter().filter(|c| c.is_pending()).collect()
    }

    /// Every conflict ever detected, resolved ones included.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn get_conflict(&self, conflict_id: &str) -> Option<&Conflict> {
        self.conflict_index.get(conflict_id).map(|&i| &self.conflicts[i])
    }

    /// Settle a pending conflict.
    ///
    /// `Existing` leaves the fact table untouched and returns the fact that
    /// was active when the conflict was detected. `Incoming` archives the
    /// key's current ACTIVE fact and creates the next version from the
    /// rejected claim.
    pub fn resolve_conflict(
        &mut self,
        conflict_id: &str,
        choice: ResolutionChoice,
        resolved_by: &str,
    ) -> CanonResult<Fact> {
        let slot = self.conflict_index.get(conflict_id).copied().ok_or_else(|| {
            CanonError::new(
                CanonErrorCode::ConflictNotFound,
                format!("no conflict with id {conflict_id}"),
            )
            .with_conflict(conflict_id)
        })?;
        self.conflicts[slot].ensure_pending()?;

        let now = self.clock.now();
        let actor = actor_of(Some(resolved_by)).to_string();

        match choice {
            ResolutionChoice::Existing => {
                let existing_id = self.conflicts[slot].existing.id.clone();
                let record = AuditRecord::new(AuditAction::Conflict, existing_id.clone(), actor.clone(), now)
                    .detail("conflictId", conflict_id)
                    .detail("choice", choice.as_str());
                self.audit.append(record)?;
                self.conflicts[slot].resolve(ConflictResolution::Existing {
                    resolved_by: actor,
                    resolved_at: now,
                })?;
                tracing::debug!(conflict = %conflict_id, "conflict resolved in favour of existing fact");

                let fact = self
                    .by_id
                    .get(&existing_id)
                    .map(|&i| self.facts[i].clone())
                    .unwrap_or_else(|| self.conflicts[slot].existing.clone());
                Ok(fact)
            }
            ResolutionChoice::Incoming => {
                ensure_capacity(&self.config, self.facts.len())?;
                let mut draft = FactDraft::from_input(&self.conflicts[slot].incoming);
                draft.metadata.created_by = actor.clone();
                let key = draft.key();

                let (index, previous_id) = match self.active.get(&key).copied() {
                    Some(existing) => {
                        let previous_id = self.facts[existing].id.clone();
                        (self.supersede(existing, draft, &actor, now, Some(slot))?, Some(previous_id))
                    }
                    None => (self.create(draft, now)?, None),
                };

                let winning_fact_id = self.facts[index].id.clone();
                let mut record = AuditRecord::new(AuditAction::Update, winning_fact_id.clone(), actor.clone(), now)
                    .detail("conflictId", conflict_id)
                    .detail("choice", choice.as_str());
                if let Some(previous_id) = previous_id {
                    record = record.detail("previousId", previous_id);
                }
                self.audit.append(record)?;
                self.conflicts[slot].resolve(ConflictResolution::Incoming {
                    resolved_by: actor,
                    resolved_at: now,
                    winning_fact_id,
                })?;
                tracing::debug!(conflict = %conflict_id, "conflict resolved in favour of incoming claim");
                Ok(self.facts[index].clone())
            }
        }
    }

    /// Audit entries in append order, optionally for one fact only.
    pub fn audit_trail(&self, fact_id: Option<&str>) -> Vec<&AuditEntry> {
        self.audit.trail(fact_id)
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Drop every fact, conflict and audit entry. Limits and clock are kept.
    pub fn clear(&mut self) {
        self.facts.clear();
        self.by_id.clear();
        self.lineages.clear();
        self.active.clear();
        self.conflicts.clear();
        self.conflict_index.clear();
        self.audit = AuditLog::new();
        self.last_hash = ContentHash::genesis();
        tracing::debug!("store cleared");
    }

    /// Archive the fact at `existing` and chain a new version of its lineage.
    ///
    /// The caller appends the UPDATE audit entry for the returned record.
    /// Pending conflicts against the archived fact are closed, except the one
    /// at `resolving`.
    fn supersede(
        &mut self,
        existing: usize,
        draft: FactDraft,
        actor: &str,
        now: DateTime<Utc>,
        resolving: Option<usize>,
    ) -> CanonResult<usize> {
        let fact = self.build(draft, now)?;
        let superseded_by = fact.id.clone();

        self.set_status(existing, FactStatus::Archived);
        self.close_conflicts(existing, actor, now, resolving);
        let record = AuditRecord::new(AuditAction::Archive, self.facts[existing].id.clone(), actor, now)
            .detail("supersededBy", superseded_by);
        self.audit.append(record)?;
        tracing::debug!(fact = %self.facts[existing].id, "fact archived");

        Ok(self.push_created(fact))
    }

    /// Chain a new fact without touching any other record.
    fn create(&mut self, draft: FactDraft, now: DateTime<Utc>) -> CanonResult<usize> {
        let fact = self.build(draft, now)?;
        Ok(self.push_created(fact))
    }

    /// Assign id, version and chain position, then hash.
    fn build(&self, draft: FactDraft, now: DateTime<Utc>) -> CanonResult<Fact> {
        let key = draft.key();
        let version = self.next_version(&key);
        ensure_version(&self.config, version)?;

        let sequence = self.facts.len() + 1;
        let seed = format!(
            "{sequence}:{key}:{}:{}",
            draft.source,
            now.to_rfc3339()
        );
        let mut fact = Fact {
            id: format!("fact_{sequence:06}_{}", &sha256_hex(seed.as_bytes())[..8]),
            fact_type: draft.fact_type,
            subject: draft.subject,
            predicate: draft.predicate,
            value: draft.value,
            source: draft.source,
            confidence: draft.confidence,
            status: FactStatus::Active,
            version,
            hash: ContentHash::genesis(),
            previous_hash: self.last_hash.clone(),
            metadata: draft.metadata,
            created_at: now,
        };
        fact.hash = hash_fact(&fact)?;
        Ok(fact)
    }

    /// Next version of a lineage: one past the highest ever recorded.
    fn next_version(&self, key: &FactKey) -> u32 {
        self.lineages
            .get(key)
            .and_then(|indices| indices.iter().map(|&i| self.facts[i].version).max())
            .map_or(1, |v| v + 1)
    }

    /// Append a record to the table and its indexes.
    pub(crate) fn push(&mut self, fact: Fact) -> usize {
        let index = self.facts.len();
        let key = fact.key();
        self.last_hash = fact.hash.clone();
        self.by_id.insert(fact.id.clone(), index);
        self.lineages.entry(key.clone()).or_default().push(index);
        if fact.is_active() {
            self.active.insert(key, index);
        }
        self.facts.push(fact);
        index
    }

    fn push_created(&mut self, fact: Fact) -> usize {
        tracing::debug!(
            fact = %fact.id,
            subject = %fact.subject,
            predicate = %fact.predicate,
            version = fact.version,
            "fact created"
        );
        self.push(fact)
    }

    fn set_status(&mut self, index: usize, status: FactStatus) {
        let fact = &mut self.facts[index];
        fact.status = status;
        if status != FactStatus::Active {
            let key = fact.key();
            if self.active.get(&key) == Some(&index) {
                self.active.remove(&key);
            }
        }
    }

    /// Close pending conflicts whose existing fact was just retired.
    ///
    /// A conflict only stands while its existing fact is the ACTIVE one for
    /// the key; once that fact is gone, the rejected claim has nothing left
    /// to contest.
    fn close_conflicts(
        &mut self,
        retired: usize,
        actor: &str,
        now: DateTime<Utc>,
        except: Option<usize>,
    ) {
        let retired_id = &self.facts[retired].id;
        let retired_as = self.facts[retired].status;
        for (slot, conflict) in self.conflicts.iter_mut().enumerate() {
            if Some(slot) == except || !conflict.is_pending() || &conflict.existing.id != retired_id {
                continue;
            }
            conflict.resolution = ConflictResolution::Superseded {
                closed_by: actor.to_string(),
                closed_at: now,
                retired_as,
            };
            tracing::debug!(conflict = %conflict.id, fact = %retired_id, "conflict closed by supersession");
        }
    }

    /// Record a new conflict and produce the error `add` returns.
    fn open_conflict(&mut self, existing: usize, input: FactInput, now: DateTime<Utc>) -> CanonError {
        let existing_fact = self.facts[existing].clone();
        let sequence = self.conflicts.len() + 1;
        let seed = format!("{sequence}:{}:{}:{}", existing_fact.id, input.value, now.to_rfc3339());
        let conflict_id = format!("conflict_{sequence:06}_{}", &sha256_hex(seed.as_bytes())[..8]);

        let record = AuditRecord::new(
            AuditAction::Conflict,
            existing_fact.id.clone(),
            actor_of(input.created_by.as_deref()),
            now,
        )
        .detail("conflictId", conflict_id.clone())
        .detail("incomingValue", input.value.clone())
        .detail("incomingSource", input.source.as_str());
        if let Err(err) = self.audit.append(record) {
            return err.into();
        }

        tracing::warn!(
            conflict = %conflict_id,
            key = %existing_fact.key(),
            existing = %existing_fact.value,
            incoming = %input.value,
            "conflict detected"
        );

        let error = CanonError::new(
            CanonErrorCode::ConflictUnresolved,
            format!("conflicting values for {}", existing_fact.key()),
        )
        .with_conflict(&conflict_id)
        .with_fact(&existing_fact.id);

        self.conflict_index.insert(conflict_id.clone(), self.conflicts.len());
        self.conflicts
            .push(Conflict::new(conflict_id, existing_fact, input, now));
        error
    }
}

fn actor_of(actor: Option<&str>) -> &str {
    match actor {
        Some(a) if !a.is_empty() => a,
        _ => DEFAULT_ACTOR,
    }
}

impl Default for CanonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CanonStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonStore")
            .field("facts", &self.facts.len())
            .field("active", &self.active.len())
            .field("conflicts", &self.conflicts.len())
            .field("audit_entries", &self.audit.len())
            .field("last_hash", &self.last_hash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canon_types::ManualClock;

    fn store() -> CanonStore {
        CanonStore::with_clock(ManualClock::default())
    }

    fn claim(source: FactSource, value: &str) -> FactInput {
        FactInput::new(FactType::Character, "Jean", "eyeColor", value, source)
    }

    #[test]
    fn first_add_creates_version_one() {
        let mut s = store();
        let fact = s.add(claim(FactSource::Text, "blue")).unwrap();
        assert_eq!(fact.version, 1);
        assert!(fact.previous_hash.is_genesis());
        assert_eq!(fact.confidence, Confidence::High);
        assert_eq!(fact.metadata.created_by, "system");
        assert!(fact.id.starts_with("fact_000001_"));
        assert_eq!(s.last_hash(), &fact.hash);
        assert_eq!(s.audit_trail(None).len(), 1);
    }

    #[test]
    fn higher_priority_supersedes() {
        let mut s = store();
        let old = s.add(claim(FactSource::Text, "blue")).unwrap();
        let new = s.add(claim(FactSource::User, "green")).unwrap();
        assert_eq!(new.version, 2);
        assert_eq!(new.previous_hash, old.hash);
        assert_eq!(s.get_fact_by_id(&old.id).unwrap().status, FactStatus::Archived);

        let actions: Vec<_> = s.audit_trail(None).iter().map(|e| e.action).collect();
        assert_eq!(actions, [AuditAction::Create, AuditAction::Archive, AuditAction::Update]);
    }

    #[test]
    fn lower_priority_is_a_no_op() {
        let mut s = store();
        let winner = s.add(claim(FactSource::User, "blue")).unwrap();
        let result = s.add(claim(FactSource::Inferred, "grey")).unwrap();
        assert_eq!(result, winner);
        assert_eq!(s.all_facts().len(), 1);
        assert_eq!(s.audit_trail(None).len(), 1);
    }

    #[test]
    fn equal_priority_same_value_is_idempotent() {
        let mut s = store();
        let first = s.add(claim(FactSource::Text, "blue")).unwrap();
        let again = s.add(claim(FactSource::Text, "blue")).unwrap();
        assert_eq!(first, again);
        assert_eq!(s.all_facts().len(), 1);
    }

    #[test]
    fn equal_priority_conflict_leaves_facts_untouched() {
        let mut s = store();
        let blue = s.add(claim(FactSource::Text, "blue")).unwrap();
        let err = s.add(claim(FactSource::Text, "green")).unwrap_err();
        assert_eq!(err.code, CanonErrorCode::ConflictUnresolved);
        let conflict_id = err.conflict_id().unwrap().to_string();
        assert!(conflict_id.starts_with("conflict_000001_"));

        assert_eq!(s.all_facts().len(), 1);
        assert_eq!(s.get_fact("Jean", "eyeColor").unwrap(), &blue);
        assert_eq!(s.pending_conflicts().len(), 1);
        let last = s.audit_trail(None).last().copied().unwrap();
        assert_eq!(last.action, AuditAction::Conflict);
        assert_eq!(last.detail_str("conflictId"), Some(conflict_id.as_str()));
    }

    #[test]
    fn resolve_existing_keeps_table() {
        let mut s = store();
        let blue = s.add(claim(FactSource::Text, "blue")).unwrap();
        let id = s.add(claim(FactSource::Text, "green")).unwrap_err().details.conflict_id.unwrap();

        let kept = s.resolve_conflict(&id, ResolutionChoice::Existing, "editor").unwrap();
        assert_eq!(kept, blue);
        assert_eq!(s.all_facts().len(), 1);
        assert!(s.pending_conflicts().is_empty());
        let conflict = s.get_conflict(&id).unwrap();
        assert_eq!(conflict.resolution.choice(), Some(ResolutionChoice::Existing));
        assert_eq!(conflict.resolution.resolved_by(), Some("editor"));
    }

    #[test]
    fn resolve_incoming_creates_next_version() {
        let mut s = store();
        let blue = s.add(claim(FactSource::Text, "blue")).unwrap();
        let id = s.add(claim(FactSource::Text, "green")).unwrap_err().details.conflict_id.unwrap();

        let green = s.resolve_conflict(&id, ResolutionChoice::Incoming, "editor").unwrap();
        assert_eq!(green.value, "green");
        assert_eq!(green.version, 2);
        assert_eq!(green.metadata.created_by, "editor");
        assert_eq!(s.get_fact_by_id(&blue.id).unwrap().status, FactStatus::Archived);
        assert_eq!(s.get_fact("Jean", "eyeColor").unwrap().id, green.id);

        match &s.get_conflict(&id).unwrap().resolution {
            ConflictResolution::Incoming { winning_fact_id, .. } => assert_eq!(winning_fact_id, &green.id),
            other => panic!("expected incoming resolution, got {other:?}"),
        }
    }

    #[test]
    fn resolving_twice_fails() {
        let mut s = store();
        s.add(claim(FactSource::Text, "blue")).unwrap();
        let id = s.add(claim(FactSource::Text, "green")).unwrap_err().details.conflict_id.unwrap();
        s.resolve_conflict(&id, ResolutionChoice::Existing, "editor").unwrap();
        let err = s.resolve_conflict(&id, ResolutionChoice::Incoming, "editor").unwrap_err();
        assert_eq!(err.code, CanonErrorCode::ConflictAlreadyResolved);
        assert_eq!(s.all_facts().len(), 1);
    }

    #[test]
    fn user_override_closes_pending_conflict() {
        let mut s = store();
        let blue = s.add(claim(FactSource::Text, "blue")).unwrap();
        let id = s.add(claim(FactSource::Text, "green")).unwrap_err().details.conflict_id.unwrap();
        let brown = s.add(claim(FactSource::User, "brown")).unwrap();

        assert!(s.pending_conflicts().is_empty());
        match &s.get_conflict(&id).unwrap().resolution {
            ConflictResolution::Superseded { retired_as, .. } => assert_eq!(*retired_as, FactStatus::Archived),
            other => panic!("expected superseded conflict, got {other:?}"),
        }

        for choice in [ResolutionChoice::Incoming, ResolutionChoice::Existing] {
            let err = s.resolve_conflict(&id, choice, "editor").unwrap_err();
            assert_eq!(err.code, CanonErrorCode::ConflictAlreadyResolved);
        }
        assert_eq!(s.get_fact("Jean", "eyeColor").unwrap(), &brown);
        assert_eq!(s.get_fact_by_id(&blue.id).unwrap().status, FactStatus::Archived);
        assert_eq!(s.all_facts().len(), 2);
    }

    #[test]
    fn update_and_delete_close_pending_conflicts() {
        let mut s = store();
        s.add(claim(FactSource::Text, "blue")).unwrap();
        let first = s.add(claim(FactSource::Text, "green")).unwrap_err().details.conflict_id.unwrap();
        s.update("Jean", "eyeColor", FactPatch::value("hazel")).unwrap();
        assert!(!s.get_conflict(&first).unwrap().is_pending());

        let second = s.add(claim(FactSource::Text, "grey")).unwrap_err().details.conflict_id.unwrap();
        assert_eq!(s.pending_conflicts().len(), 1);
        s.delete("Jean", "eyeColor", Some("admin"), None).unwrap();
        let closed = s.get_conflict(&second).unwrap();
        assert_eq!(closed.resolution.resolved_by(), Some("admin"));
        assert!(s.pending_conflicts().is_empty());
    }

    #[test]
    fn resolving_one_conflict_closes_its_siblings() {
        let mut s = store();
        s.add(claim(FactSource::Text, "blue")).unwrap();
        let green = s.add(claim(FactSource::Text, "green")).unwrap_err().details.conflict_id.unwrap();
        let grey = s.add(claim(FactSource::Text, "grey")).unwrap_err().details.conflict_id.unwrap();

        s.resolve_conflict(&green, ResolutionChoice::Incoming, "editor").unwrap();
        assert_eq!(
            s.get_conflict(&green).unwrap().resolution.choice(),
            Some(ResolutionChoice::Incoming)
        );
        assert!(!s.get_conflict(&grey).unwrap().is_pending());
        assert_eq!(s.get_fact("Jean", "eyeColor").unwrap().value, "green");
    }

    #[test]
    fn unknown_conflict_fails() {
        let mut s = store();
        let err = s
            .resolve_conflict("conflict_999999_deadbeef", ResolutionChoice::Existing, "editor")
            .unwrap_err();
        assert_eq!(err.code, CanonErrorCode::ConflictNotFound);
    }

    #[test]
    fn update_creates_new_version() {
        let mut s = store();
        let old = s
            .add(FactInput::new(FactType::Character, "Jean", "age", "35", FactSource::Text).with_tags(["bio"]))
            .unwrap();
        let new = s
            .update("Jean", "age", FactPatch::value("36").updated_by("editor").with_reason("birthday"))
            .unwrap();
        assert_eq!(new.version, 2);
        assert_eq!(new.source, FactSource::Text);
        assert_eq!(new.metadata.tags, vec!["bio".to_string()]);
        assert_eq!(new.metadata.notes.as_deref(), Some("birthday"));
        assert_eq!(s.get_fact_by_id(&old.id).unwrap().status, FactStatus::Archived);

        let update = s.audit_trail(Some(&new.id))[0];
        assert_eq!(update.action, AuditAction::Update);
        assert_eq!(update.actor, "editor");
        assert_eq!(update.detail_str("previousValue"), Some("35"));
    }

    #[test]
    fn update_missing_fact_fails() {
        let mut s = store();
        let err = s.update("Nobody", "age", FactPatch::value("1")).unwrap_err();
        assert_eq!(err.code, CanonErrorCode::FactNotFound);
    }

    #[test]
    fn delete_is_soft() {
        let mut s = store();
        let fact = s.add(claim(FactSource::User, "blue")).unwrap();
        let deleted = s.delete("Jean", "eyeColor", Some("admin"), Some("cleanup")).unwrap();
        assert_eq!(deleted.status, FactStatus::Deleted);
        assert_eq!(deleted.hash, fact.hash);
        assert!(!s.has("Jean", "eyeColor"));
        assert_eq!(s.all_facts().len(), 1);

        let entry = s.audit_trail(Some(&fact.id))[1];
        assert_eq!(entry.action, AuditAction::Delete);
        assert_eq!(entry.detail_str("reason"), Some("cleanup"));

        let err = s.delete("Jean", "eyeColor", Some("admin"), None).unwrap_err();
        assert_eq!(err.code, CanonErrorCode::FactNotFound);
    }

    #[test]
    fn readd_after_delete_continues_the_lineage() {
        let mut s = store();
        s.add(claim(FactSource::User, "blue")).unwrap();
        s.delete("Jean", "eyeColor", Some("admin"), None).unwrap();
        let again = s.add(claim(FactSource::Inferred, "grey")).unwrap();
        assert_eq!(again.version, 2);
        assert!(again.is_active());
    }

    #[test]
    fn version_limit_is_enforced() {
        let config = CanonConfig {
            max_versions_per_fact: 2,
            ..CanonConfig::default()
        };
        let mut s = CanonStore::with_config(config, ManualClock::default());
        s.add(claim(FactSource::Inferred, "a")).unwrap();
        s.update("Jean", "eyeColor", FactPatch::value("b")).unwrap();
        let err = s.update("Jean", "eyeColor", FactPatch::value("c")).unwrap_err();
        assert_eq!(err.code, CanonErrorCode::MaxVersionsExceeded);
        assert_eq!(s.get_fact("Jean", "eyeColor").unwrap().value, "b");
        assert_eq!(s.all_facts().len(), 2);
    }

    #[test]
    fn validation_failure_does_not_mutate() {
        let mut s = store();
        let err = s.add(FactInput::new(FactType::Object, "", "p", "v", FactSource::User)).unwrap_err();
        assert_eq!(err.code, CanonErrorCode::InvalidSubject);
        assert!(s.all_facts().is_empty());
        assert!(s.audit_trail(None).is_empty());
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = store();
        s.add(claim(FactSource::Text, "blue")).unwrap();
        let _ = s.add(claim(FactSource::Text, "green"));
        s.clear();
        assert!(s.all_facts().is_empty());
        assert!(s.pending_conflicts().is_empty());
        assert!(s.audit_trail(None).is_empty());
        assert!(s.last_hash().is_genesis());
        let fact = s.add(claim(FactSource::Text, "blue")).unwrap();
        assert!(fact.previous_hash.is_genesis());
    }
}
