use std::collections::BTreeMap;

use canon_types::{ContentHash, FactSource, FactStatus, FactType};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::CanonStore;

/// Counters over the whole fact table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonMetrics {
    pub total_facts: usize,
    pub active_facts: usize,
    pub archived_facts: usize,
    pub deleted_facts: usize,
    /// Conflicts waiting for a resolution.
    pub conflicted: usize,
    /// Every fact type, zero counts included.
    pub by_type: BTreeMap<FactType, usize>,
    /// Every source, zero counts included.
    pub by_source: BTreeMap<FactSource, usize>,
    pub audit_entries: usize,
    pub current_root_hash: ContentHash,
    /// Timestamp of the latest audit entry.
    pub last_modified: Option<DateTime<Utc>>,
}

impl CanonStore {
    pub fn metrics(&self) -> CanonMetrics {
        let mut by_type: BTreeMap<FactType, usize> = FactType::ALL.iter().map(|t| (*t, 0)).collect();
        let mut by_source: BTreeMap<FactSource, usize> =
            FactSource::ALL.iter().map(|s| (*s, 0)).collect();
        let (mut active, mut archived, mut deleted) = (0, 0, 0);

        for fact in &self.facts {
            *by_type.entry(fact.fact_type).or_default() += 1;
            *by_source.entry(fact.source).or_default() += 1;
            match fact.status {
                FactStatus::Active => active += 1,
                FactStatus::Archived => archived += 1,
                FactStatus::Deleted => deleted += 1,
            }
        }

        CanonMetrics {
            total_facts: self.facts.len(),
            active_facts: active,
            archived_facts: archived,
            deleted_facts: deleted,
            conflicted: self.conflicts.iter().filter(|c| c.is_pending()).count(),
            by_type,
            by_source,
            audit_entries: self.audit.len(),
            current_root_hash: self.current_root_hash(),
            last_modified: self.audit.last_timestamp(),
        }
    }
}
