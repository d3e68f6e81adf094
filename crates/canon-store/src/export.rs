use std::collections::{HashMap, HashSet};

use canon_audit::AuditLog;
use canon_crypto::{compute_merkle_root, hash_export, HashChainVerifier};
use canon_types::{
    CanonError, CanonErrorCode, CanonResult, Clock, ContentHash, ExportBlob, FactKey,
    SystemClock, CANON_MAGIC, CANON_VERSION,
};

use crate::config::CanonConfig;
use crate::integrity::audit_disagreements;
use crate::store::CanonStore;

impl CanonStore {
    /// Serialize the full state, sealed by an export hash.
    ///
    /// Conflicts are not part of an export.
    pub fn export(&self) -> CanonResult<ExportBlob> {
        let snapshot = self.create_snapshot();
        let mut blob = ExportBlob {
            magic: CANON_MAGIC.to_string(),
            version: CANON_VERSION.to_string(),
            exported_at: snapshot.timestamp,
            snapshot,
            facts: self.facts.clone(),
            audit_trail: self.audit.entries().to_vec(),
            export_hash: ContentHash::genesis(),
        };
        blob.export_hash = hash_export(&blob.payload())?;

        tracing::info!(
            facts = blob.facts.len(),
            audit_entries = blob.audit_trail.len(),
            export_hash = %blob.export_hash.short(),
            "store exported"
        );
        Ok(blob)
    }

    /// Rebuild a store from an export, with default limits and the system clock.
    pub fn import(blob: &ExportBlob) -> CanonResult<Self> {
        Self::import_with(blob, CanonConfig::default(), SystemClock)
    }

    /// Rebuild a store from an export.
    ///
    /// Checks run in order (magic, format version, export hash, fact hashes
    /// and chain, audit chain, statuses against the audit trail, snapshot
    /// fields) and all of them complete before
    /// any state is built, so a rejected blob leaves nothing behind.
    pub fn import_with(
        blob: &ExportBlob,
        config: CanonConfig,
        clock: impl Clock + 'static,
    ) -> CanonResult<Self> {
        verify_blob(blob, &config).inspect_err(|err| {
            tracing::warn!(code = %err.code, reason = %err.message, "import rejected");
        })?;

        let audit = AuditLog::from_entries(blob.audit_trail.clone())?;
        let mut store = Self::with_config(config, clock);
        for fact in &blob.facts {
            store.push(fact.clone());
        }
        store.audit = audit;

        tracing::info!(
            facts = store.facts.len(),
            audit_entries = store.audit.len(),
            "store imported"
        );
        Ok(store)
    }

    /// Decode JSON bytes and import them.
    pub fn import_bytes(bytes: &[u8]) -> CanonResult<Self> {
        let blob = ExportBlob::from_bytes(bytes).map_err(CanonError::serialization)?;
        Self::import(&blob)
    }
}

fn verify_blob(blob: &ExportBlob, config: &CanonConfig) -> CanonResult<()> {
    if blob.magic != CANON_MAGIC {
        return Err(CanonError::new(
            CanonErrorCode::InvalidMagic,
            format!("expected magic {CANON_MAGIC}, found {:?}", blob.magic),
        ));
    }
    if blob.version != CANON_VERSION {
        return Err(CanonError::new(
            CanonErrorCode::UnsupportedVersion,
            format!("unsupported format version {}", blob.version),
        ));
    }

    let computed = hash_export(&blob.payload())?;
    if computed != blob.export_hash {
        return Err(CanonError::new(CanonErrorCode::HashMismatch, "export hash mismatch")
            .with_hashes(blob.export_hash.clone(), computed));
    }

    if blob.facts.len() > config.max_total_facts {
        return Err(CanonError::new(
            CanonErrorCode::MaxFactsExceeded,
            format!(
                "export holds {} facts, limit is {}",
                blob.facts.len(),
                config.max_total_facts
            ),
        ));
    }

    if let Err(err) = HashChainVerifier::verify_chain(&blob.facts) {
        return Err(CanonError::new(CanonErrorCode::IntegrityViolation, err.to_string())
            .with_fact(err.id()));
    }

    let mut seen = HashSet::new();
    let mut active: HashMap<FactKey, &str> = HashMap::new();
    for fact in &blob.facts {
        if !seen.insert(fact.id.as_str()) {
            return Err(integrity(format!("duplicate fact id {}", fact.id)).with_fact(&fact.id));
        }
        if fact.is_active() {
            if let Some(other) = active.insert(fact.key(), &fact.id) {
                return Err(integrity(format!(
                    "facts {other} and {} are both active for {}",
                    fact.id,
                    fact.key()
                ))
                .with_fact(&fact.id));
            }
        }
    }

    if let Err(err) = HashChainVerifier::verify_chain(&blob.audit_trail) {
        return Err(integrity(format!("audit trail: {err}")));
    }
    if let Some(defect) = audit_disagreements(&blob.facts, &blob.audit_trail).into_iter().next() {
        return Err(integrity(defect));
    }

    let snapshot = &blob.snapshot;
    if snapshot.fact_count != blob.facts.len() {
        return Err(integrity(format!(
            "snapshot counts {} facts, export holds {}",
            snapshot.fact_count,
            blob.facts.len()
        )));
    }
    let mut leaves: Vec<_> = blob.facts.iter().collect();
    leaves.sort_by(|a, b| a.id.cmp(&b.id));
    let hashes: Vec<ContentHash> = leaves.into_iter().map(|f| f.hash.clone()).collect();
    let root = compute_merkle_root(&hashes);
    if root != snapshot.root_hash {
        return Err(integrity("snapshot root does not match the exported facts")
            .with_hashes(snapshot.root_hash.clone(), root));
    }

    let fact_tip = blob.facts.last().map_or_else(ContentHash::genesis, |f| f.hash.clone());
    if fact_tip != snapshot.last_fact_hash {
        return Err(integrity("snapshot fact tip does not match the exported facts")
            .with_hashes(snapshot.last_fact_hash.clone(), fact_tip));
    }
    let audit_head = blob.audit_trail.last().map_or_else(ContentHash::genesis, |e| e.hash.clone());
    if audit_head != snapshot.audit_head {
        return Err(integrity("snapshot audit head does not match the exported trail")
            .with_hashes(snapshot.audit_head.clone(), audit_head));
    }
    if snapshot.audit_sequence != blob.audit_trail.len() as u64 {
        return Err(integrity(format!(
            "snapshot counts {} audit entries, export holds {}",
            snapshot.audit_sequence,
            blob.audit_trail.len()
        )));
    }

    Ok(())
}

fn integrity(message: impl Into<String>) -> CanonError {
    CanonError::new(CanonErrorCode::IntegrityViolation, message)
}
