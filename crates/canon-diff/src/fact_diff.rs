//! State-level diff: compare two fact states.
//!
//! States are represented as `BTreeMap<FactKey, Fact>` holding at most one
//! fact per key, so the diff comes out ordered by subject then predicate.

use std::collections::BTreeMap;

use canon_types::{Fact, FactKey};
use serde::Serialize;

/// The facts that are ACTIVE at some point, keyed by lineage.
pub type FactState = BTreeMap<FactKey, Fact>;

/// The result of comparing two fact states.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactDiff {
    /// Facts whose key has no counterpart in the old state.
    pub added: Vec<Fact>,
    /// Facts whose key has no counterpart in the new state.
    pub removed: Vec<Fact>,
    /// Keys whose winning fact was replaced.
    pub changed: Vec<FactChange>,
}

/// A key whose fact differs between the two states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FactChange {
    pub before: Fact,
    pub after: Fact,
}

impl FactChange {
    pub fn key(&self) -> FactKey {
        self.after.key()
    }

    /// Returns `true` if the replacement carries a different value.
    pub fn value_changed(&self) -> bool {
        self.before.value != self.after.value
    }
}

impl FactDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the two states were identical.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of changed keys.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Compute the diff between two fact states.
///
/// Keys present only in `new` are added, keys present only in `old` are
/// removed, and keys present in both whose fact id differs are changed. A
/// fact id only differs when a new version superseded the old one.
pub fn diff_fact_sets(old: &FactState, new: &FactState) -> FactDiff {
    let mut diff = FactDiff::new();

    for (key, before) in old {
        match new.get(key) {
            Some(after) if after.id != before.id => diff.changed.push(FactChange {
                before: before.clone(),
                after: after.clone(),
            }),
            Some(_) => {}
            None => diff.removed.push(before.clone()),
        }
    }

    diff.added = new
        .iter()
        .filter(|(key, _)| !old.contains_key(*key))
        .map(|(_, fact)| fact.clone())
        .collect();

    diff
}
