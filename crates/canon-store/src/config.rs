use serde::{Deserialize, Serialize};

use canon_types::{CanonError, CanonErrorCode};

/// Limits enforced by a [`CanonStore`](crate::CanonStore).
///
/// Lengths are counted in characters, not bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonConfig {
    pub max_subject_length: usize,
    pub max_predicate_length: usize,
    pub max_value_length: usize,
    /// Maximum number of tags on one fact.
    pub max_tags: usize,
    /// Maximum number of fact records of any status.
    pub max_total_facts: usize,
    /// Highest version a single `(subject, predicate)` lineage may reach.
    pub max_versions_per_fact: u32,
}

impl Default for CanonConfig {
    fn default() -> Self {
        Self {
            max_subject_length: 256,
            max_predicate_length: 128,
            max_value_length: 10_000,
            max_tags: 32,
            max_total_facts: 100_000,
            max_versions_per_fact: 1_000,
        }
    }
}

impl CanonConfig {
    /// Tighter limits for small embedded stores.
    pub fn strict() -> Self {
        Self {
            max_subject_length: 128,
            max_predicate_length: 64,
            max_value_length: 2_000,
            max_tags: 8,
            max_total_facts: 10_000,
            max_versions_per_fact: 100,
        }
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(source: &str) -> Result<Self, CanonError> {
        toml::from_str(source).map_err(|e| {
            CanonError::new(CanonErrorCode::Serialization, format!("invalid config: {e}"))
        })
    }

    pub fn to_toml_string(&self) -> Result<String, CanonError> {
        toml::to_string_pretty(self).map_err(CanonError::serialization)
    }
}
