use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// Machine-readable failure codes returned by Canon operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonErrorCode {
    InvalidSubject,
    InvalidPredicate,
    SubjectTooLong,
    PredicateTooLong,
    ValueTooLong,
    TooManyTags,
    /// Equal-priority claims disagree; `details.conflict_id` names the conflict.
    ConflictUnresolved,
    ConflictNotFound,
    ConflictAlreadyResolved,
    FactNotFound,
    MaxFactsExceeded,
    MaxVersionsExceeded,
    HashMismatch,
    InvalidMagic,
    UnsupportedVersion,
    IntegrityViolation,
    Serialization,
    Sink,
}

impl CanonErrorCode {
    /// The wire spelling of the code (`CONFLICT_UNRESOLVED`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSubject => "INVALID_SUBJECT",
            Self::InvalidPredicate => "INVALID_PREDICATE",
            Self::SubjectTooLong => "SUBJECT_TOO_LONG",
            Self::PredicateTooLong => "PREDICATE_TOO_LONG",
            Self::ValueTooLong => "VALUE_TOO_LONG",
            Self::TooManyTags => "TOO_MANY_TAGS",
            Self::ConflictUnresolved => "CONFLICT_UNRESOLVED",
            Self::ConflictNotFound => "CONFLICT_NOT_FOUND",
            Self::ConflictAlreadyResolved => "CONFLICT_ALREADY_RESOLVED",
            Self::FactNotFound => "FACT_NOT_FOUND",
            Self::MaxFactsExceeded => "MAX_FACTS_EXCEEDED",
            Self::MaxVersionsExceeded => "MAX_VERSIONS_EXCEEDED",
            Self::HashMismatch => "HASH_MISMATCH",
            Self::InvalidMagic => "INVALID_MAGIC",
            Self::UnsupportedVersion => "UNSUPPORTED_VERSION",
            Self::IntegrityViolation => "INTEGRITY_VIOLATION",
            Self::Serialization => "SERIALIZATION",
            Self::Sink => "SINK",
        }
    }

    /// Validation codes never mutate the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSubject
                | Self::InvalidPredicate
                | Self::SubjectTooLong
                | Self::PredicateTooLong
                | Self::ValueTooLong
                | Self::TooManyTags
        )
    }
}

impl fmt::Display for CanonErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured context attached to a [`CanonError`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hash: Option<ContentHash>,
}

impl ErrorDetails {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The failure half of every fallible Canon operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct CanonError {
    pub code: CanonErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "ErrorDetails::is_empty")]
    pub details: ErrorDetails,
}

impl CanonError {
    pub fn new(code: CanonErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: ErrorDetails::default(),
        }
    }

    pub fn with_conflict(mut self, conflict_id: impl Into<String>) -> Self {
        self.details.conflict_id = Some(conflict_id.into());
        self
    }

    pub fn with_fact(mut self, fact_id: impl Into<String>) -> Self {
        self.details.fact_id = Some(fact_id.into());
        self
    }

    pub fn with_hashes(mut self, expected: ContentHash, actual: ContentHash) -> Self {
        self.details.expected_hash = Some(expected);
        self.details.actual_hash = Some(actual);
        self
    }

    /// Conflict id carried by a `CONFLICT_UNRESOLVED` failure.
    pub fn conflict_id(&self) -> Option<&str> {
        self.details.conflict_id.as_deref()
    }

    pub fn fact_not_found(subject: &str, predicate: &str) -> Self {
        Self::new(
            CanonErrorCode::FactNotFound,
            format!("no active fact for {subject}:{predicate}"),
        )
    }

    pub fn serialization(err: impl fmt::Display) -> Self {
        Self::new(CanonErrorCode::Serialization, err.to_string())
    }
}

/// Convenience alias for Canon results.
pub type CanonResult<T> = Result<T, CanonError>;
