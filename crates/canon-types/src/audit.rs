use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hash::ContentHash;

/// Kind of mutation recorded by an audit entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Archive,
    Delete,
    Conflict,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Archive => "ARCHIVE",
            Self::Delete => "DELETE",
            Self::Conflict => "CONFLICT",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the hash-chained audit log.
///
/// The audit chain is independent of the fact chain but starts from the same
/// genesis link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    /// 1-based position in the log.
    pub sequence: u64,
    pub action: AuditAction,
    pub fact_id: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    pub hash: ContentHash,
    pub previous_hash: ContentHash,
}

/// The hashed view of an [`AuditEntry`]: every field except `hash`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditContent<'a> {
    pub id: &'a str,
    pub sequence: u64,
    pub action: AuditAction,
    pub fact_id: &'a str,
    pub actor: &'a str,
    pub timestamp: &'a DateTime<Utc>,
    pub details: &'a BTreeMap<String, Value>,
    pub previous_hash: &'a ContentHash,
}

impl AuditEntry {
    pub fn content(&self) -> AuditContent<'_> {
        AuditContent {
            id: &self.id,
            sequence: self.sequence,
            action: self.action,
            fact_id: &self.fact_id,
            actor: &self.actor,
            timestamp: &self.timestamp,
            details: &self.details,
            previous_hash: &self.previous_hash,
        }
    }

    /// A string detail, if present.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}
