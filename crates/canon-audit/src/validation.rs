use canon_crypto::{ChainError, HashChainVerifier};
use canon_types::AuditEntry;

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub sequence: u64,
    pub entry_id: String,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    HashChainBreak,
    HashMismatch,
}

/// Audit chain validator.
pub struct AuditValidator;

impl AuditValidator {
    /// Validate sequence numbering and the hash chain of `entries`.
    ///
    /// Violations are reported in entry order.
    pub fn validate(entries: &[AuditEntry]) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            let expected_seq = index as u64 + 1;
            if entry.sequence != expected_seq {
                violations.push(Violation {
                    sequence: entry.sequence,
                    entry_id: entry.id.clone(),
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected sequence {expected_seq}, got {}", entry.sequence),
                });
            }
        }

        for err in HashChainVerifier::chain_breaks(entries) {
            let sequence = entries
                .get(err.index())
                .map_or(err.index() as u64 + 1, |e| e.sequence);
            let kind = match err {
                ChainError::BrokenLink { .. } => ViolationKind::HashChainBreak,
                ChainError::HashMismatch { .. } | ChainError::Unhashable { .. } => {
                    ViolationKind::HashMismatch
                }
            };
            violations.push(Violation {
                sequence,
                entry_id: err.id().to_string(),
                kind,
                description: err.to_string(),
            });
        }

        violations.sort_by_key(|v| v.sequence);
        violations
    }
}
