use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AuditEntry;
use crate::fact::Fact;
use crate::hash::ContentHash;

/// Identifies a Canon export document.
pub const CANON_MAGIC: &str = "OMEGA_CANON";

/// Format version of snapshots and exports.
pub const CANON_VERSION: &str = "1.0.0";

/// Point-in-time commitment over the fact table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Number of fact records (any status) committed; also the diff cut point.
    pub fact_count: usize,
    /// Merkle root over every fact hash, leaves ordered by fact id.
    pub root_hash: ContentHash,
    /// Tip of the fact chain when the snapshot was taken.
    pub last_fact_hash: ContentHash,
    /// Tip of the audit chain when the snapshot was taken.
    pub audit_head: ContentHash,
    /// Number of audit entries committed; status changes after it are after the cut.
    pub audit_sequence: u64,
    pub version: String,
}

/// Full serialized state of a store, sealed by `export_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBlob {
    pub magic: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub snapshot: Snapshot,
    /// Every fact in creation order.
    pub facts: Vec<Fact>,
    pub audit_trail: Vec<AuditEntry>,
    /// `sha256(canonicalize({facts, auditTrail, version}))`.
    pub export_hash: ContentHash,
}

/// The sealed part of an [`ExportBlob`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload<'a> {
    pub facts: &'a [Fact],
    pub audit_trail: &'a [AuditEntry],
    pub version: &'a str,
}

impl ExportBlob {
    pub fn payload(&self) -> ExportPayload<'_> {
        ExportPayload {
            facts: &self.facts,
            audit_trail: &self.audit_trail,
            version: &self.version,
        }
    }

    /// Encode as JSON bytes for a byte sink.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode JSON bytes produced by [`to_bytes`](Self::to_bytes).
    ///
    /// Decoding does not verify anything; pass the blob to the store's
    /// import to check it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
