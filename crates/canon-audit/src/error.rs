use canon_crypto::HashError;
use canon_types::{CanonError, CanonErrorCode};

/// Errors produced by audit log operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    #[error("integrity violation at sequence {sequence}: {reason}")]
    IntegrityViolation { sequence: u64, reason: String },

    #[error(transparent)]
    Hash(#[from] HashError),
}

pub type AuditResult<T> = Result<T, AuditError>;

impl From<AuditError> for CanonError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::IntegrityViolation { .. } => {
                CanonError::new(CanonErrorCode::IntegrityViolation, err.to_string())
            }
            AuditError::Hash(hash) => hash.into(),
        }
    }
}
