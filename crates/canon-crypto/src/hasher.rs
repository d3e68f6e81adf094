use canon_types::{AuditEntry, CanonError, ContentHash, ExportPayload, Fact};
use serde::Serialize;

use crate::canonical::canonical_json;

/// Errors from hashing operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<HashError> for CanonError {
    fn from(err: HashError) -> Self {
        CanonError::serialization(err)
    }
}

/// SHA-256 of raw bytes as 64 lowercase hex characters.
pub fn sha256_hex(data: &[u8]) -> String {
    ContentHash::of(data).as_str().to_string()
}

/// SHA-256 over the canonical JSON encoding of `value`.
pub fn hash_canonical<T: Serialize + ?Sized>(value: &T) -> Result<ContentHash, HashError> {
    let encoded = canonical_json(value)?;
    Ok(ContentHash::of(encoded.as_bytes()))
}

/// Content hash of a fact: every field except `hash` and `status`.
pub fn hash_fact(fact: &Fact) -> Result<ContentHash, HashError> {
    hash_canonical(&fact.content())
}

/// Returns `true` if the stored hash matches the fact's content.
pub fn verify_fact_hash(fact: &Fact) -> bool {
    hash_fact(fact).is_ok_and(|h| h == fact.hash)
}

/// Content hash of an audit entry: every field except `hash`.
pub fn hash_audit_entry(entry: &AuditEntry) -> Result<ContentHash, HashError> {
    hash_canonical(&entry.content())
}

pub fn verify_audit_hash(entry: &AuditEntry) -> bool {
    hash_audit_entry(entry).is_ok_and(|h| h == entry.hash)
}

/// Seal over `{facts, auditTrail, version}` of an export.
pub fn hash_export(payload: &ExportPayload<'_>) -> Result<ContentHash, HashError> {
    hash_canonical(payload)
}
