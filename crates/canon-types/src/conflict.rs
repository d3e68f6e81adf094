use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CanonError, CanonErrorCode};
use crate::fact::{Fact, FactInput, FactKey, FactStatus};

/// Which side of a conflict wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionChoice {
    Existing,
    Incoming,
}

impl ResolutionChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Incoming => "incoming",
        }
    }
}

impl fmt::Display for ResolutionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "existing" => Ok(Self::Existing),
            "incoming" => Ok(Self::Incoming),
            other => Err(format!("unknown resolution choice: {other}")),
        }
    }
}

/// Conflict state machine: `Pending -> {Existing, Incoming, Superseded}`.
///
/// Every state but `Pending` is terminal. `Superseded` closes a conflict
/// whose existing fact was retired by something other than a resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictResolution {
    #[default]
    Pending,
    #[serde(rename_all = "camelCase")]
    Existing {
        resolved_by: String,
        resolved_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Incoming {
        resolved_by: String,
        resolved_at: DateTime<Utc>,
        winning_fact_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Superseded {
        closed_by: String,
        closed_at: DateTime<Utc>,
        /// Status the existing fact moved to.
        retired_as: FactStatus,
    },
}

impl ConflictResolution {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn choice(&self) -> Option<ResolutionChoice> {
        match self {
            Self::Pending => None,
            Self::Existing { .. } => Some(ResolutionChoice::Existing),
            Self::Incoming { .. } => Some(ResolutionChoice::Incoming),
            Self::Superseded { .. } => None,
        }
    }

    pub fn resolved_by(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Existing { resolved_by, .. } | Self::Incoming { resolved_by, .. } => {
                Some(resolved_by)
            }
            Self::Superseded { closed_by, .. } => Some(closed_by),
        }
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Pending => None,
            Self::Existing { resolved_at, .. } | Self::Incoming { resolved_at, .. } => {
                Some(*resolved_at)
            }
            Self::Superseded { closed_at, .. } => Some(*closed_at),
        }
    }
}

/// Two equal-priority claims with different values for the same key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub id: String,
    pub subject: String,
    pub predicate: String,
    /// The fact that was active when the conflict was detected.
    pub existing: Fact,
    /// The rejected claim, kept verbatim so it can win later.
    pub incoming: FactInput,
    pub detected_at: DateTime<Utc>,
    pub resolution: ConflictResolution,
}

impl Conflict {
    pub fn new(id: String, existing: Fact, incoming: FactInput, detected_at: DateTime<Utc>) -> Self {
        Self {
            id,
            subject: existing.subject.clone(),
            predicate: existing.predicate.clone(),
            existing,
            incoming,
            detected_at,
            resolution: ConflictResolution::Pending,
        }
    }

    pub fn key(&self) -> FactKey {
        FactKey::new(&self.subject, &self.predicate)
    }

    pub fn is_pending(&self) -> bool {
        self.resolution.is_pending()
    }

    /// Fails with `CONFLICT_ALREADY_RESOLVED` unless the conflict is pending.
    pub fn ensure_pending(&self) -> Result<(), CanonError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(CanonError::new(
                CanonErrorCode::ConflictAlreadyResolved,
                format!("conflict {} is already resolved", self.id),
            )
            .with_conflict(&self.id))
        }
    }

    /// Apply a terminal resolution.
    pub fn resolve(&mut self, resolution: ConflictResolution) -> Result<(), CanonError> {
        self.ensure_pending()?;
        if resolution.is_pending() {
            return Err(CanonError::new(
                CanonErrorCode::ConflictUnresolved,
                format!("conflict {} cannot be reset to pending", self.id),
            )
            .with_conflict(&self.id));
        }
        self.resolution = resolution;
        Ok(())
    }
}
