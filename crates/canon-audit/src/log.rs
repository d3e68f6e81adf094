use std::collections::{BTreeMap, HashMap};

use canon_crypto::{hash_audit_entry, sha256_hex};
use canon_types::{AuditAction, AuditEntry, ContentHash};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{AuditError, AuditResult};
use crate::validation::{AuditValidator, Violation};

/// A mutation to be recorded, before the log assigns its id, sequence and hashes.
#[derive(Clone, Debug, PartialEq)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub fact_id: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub details: BTreeMap<String, Value>,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        fact_id: impl Into<String>,
        actor: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            fact_id: fact_id.into(),
            actor: actor.into(),
            timestamp,
            details: BTreeMap::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Append-only, hash-chained audit log.
///
/// Entries are numbered from 1 and each entry's `previous_hash` is the hash
/// of the entry before it, starting from the genesis hash.
#[derive(Clone, Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    by_fact: HashMap<String, Vec<usize>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from previously exported entries.
    ///
    /// The entries must form an intact chain; the first violation is
    /// returned otherwise.
    pub fn from_entries(entries: Vec<AuditEntry>) -> AuditResult<Self> {
        if let Some(violation) = AuditValidator::validate(&entries).into_iter().next() {
            return Err(AuditError::IntegrityViolation {
                sequence: violation.sequence,
                reason: violation.description,
            });
        }

        let mut log = Self::new();
        for entry in entries {
            log.push(entry);
        }
        Ok(log)
    }

    /// Append a record, chaining it to the current head.
    pub fn append(&mut self, record: AuditRecord) -> AuditResult<&AuditEntry> {
        let sequence = self.entries.len() as u64 + 1;
        let seed = format!(
            "{sequence}:{}:{}:{}",
            record.action,
            record.fact_id,
            record.timestamp.to_rfc3339()
        );

        let mut entry = AuditEntry {
            id: format!("audit_{sequence:06}_{}", &sha256_hex(seed.as_bytes())[..8]),
            sequence,
            action: record.action,
            fact_id: record.fact_id,
            actor: record.actor,
            timestamp: record.timestamp,
            details: record.details,
            hash: ContentHash::genesis(),
            previous_hash: self.head(),
        };
        entry.hash = hash_audit_entry(&entry)?;

        tracing::debug!(
            audit = %entry.id,
            action = %entry.action,
            fact = %entry.fact_id,
            "audit entry appended"
        );

        let index = self.push(entry);
        Ok(&self.entries[index])
    }

    fn push(&mut self, entry: AuditEntry) -> usize {
        let index = self.entries.len();
        self.by_fact
            .entry(entry.fact_id.clone())
            .or_default()
            .push(index);
        self.entries.push(entry);
        index
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Entries in append order, optionally restricted to one fact.
    pub fn trail(&self, fact_id: Option<&str>) -> Vec<&AuditEntry> {
        match fact_id {
            None => self.entries.iter().collect(),
            Some(id) => self
                .by_fact
                .get(id)
                .map(|indices| indices.iter().map(|&i| &self.entries[i]).collect())
                .unwrap_or_default(),
        }
    }

    /// Hash of the latest entry, or genesis for an empty log.
    pub fn head(&self) -> ContentHash {
        self.entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(ContentHash::genesis)
    }

    /// Sequence number of the latest entry, 0 when empty.
    pub fn sequence(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.last().map(|e| e.timestamp)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the whole log; an empty result means the chain is intact.
    pub fn verify(&self) -> Vec<Violation> {
        AuditValidator::validate(&self.entries)
    }
}
