use std::cmp::Reverse;

use canon_types::{Fact, FactKey, FactSource, FactStatus, FactType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::CanonStore;

/// Which lifecycle states a query sees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusScope {
    /// ACTIVE facts only.
    #[default]
    Active,
    /// Facts in exactly this status.
    Only(FactStatus),
    /// Every record, whatever its status.
    Any,
}

impl StatusScope {
    fn admits(&self, status: FactStatus) -> bool {
        match self {
            Self::Active => status == FactStatus::Active,
            Self::Only(wanted) => status == *wanted,
            Self::Any => true,
        }
    }
}

/// Criteria for [`CanonStore::query`]. Every set field must match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactFilter {
    pub fact_type: Option<FactType>,
    pub subject: Option<String>,
    pub predicate: Option<String>,
    pub source: Option<FactSource>,
    pub status: StatusScope,
    /// Matches facts carrying at least one of these tags.
    pub tags: Vec<String>,
    /// Exclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl FactFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fact_type(mut self, fact_type: FactType) -> Self {
        self.fact_type = Some(fact_type);
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn source(mut self, source: FactSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn status(mut self, status: FactStatus) -> Self {
        self.status = StatusScope::Only(status);
        self
    }

    pub fn any_status(mut self) -> Self {
        self.status = StatusScope::Any;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.created_after = Some(instant);
        self
    }

    pub fn created_before(mut self, instant: DateTime<Utc>) -> Self {
        self.created_before = Some(instant);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn matches(&self, fact: &Fact) -> bool {
        self.status.admits(fact.status)
            && self.fact_type.map_or(true, |t| fact.fact_type == t)
            && self.subject.as_deref().map_or(true, |s| fact.subject == s)
            && self.predicate.as_deref().map_or(true, |p| fact.predicate == p)
            && self.source.map_or(true, |s| fact.source == s)
            && self.created_after.map_or(true, |t| fact.created_at > t)
            && self.created_before.map_or(true, |t| fact.created_at < t)
            && (self.tags.is_empty() || self.tags.iter().any(|t| fact.metadata.tags.contains(t)))
    }
}

impl CanonStore {
    /// Facts matching `filter`, ordered by subject, predicate, version
    /// descending, then id, and paginated.
    pub fn query(&self, filter: &FactFilter) -> Vec<&Fact> {
        let mut results: Vec<&Fact> = self.facts.iter().filter(|f| filter.matches(f)).collect();
        results.sort_by(|a, b| {
            (&a.subject, &a.predicate, Reverse(a.version), &a.id)
                .cmp(&(&b.subject, &b.predicate, Reverse(b.version), &b.id))
        });

        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(usize::MAX);
        results.into_iter().skip(offset).take(limit).collect()
    }

    /// Number of records matching `filter`; every record when `None`.
    pub fn count(&self, filter: Option<&FactFilter>) -> usize {
        match filter {
            None => self.facts.len(),
            Some(filter) => self.query(filter).len(),
        }
    }

    /// The ACTIVE fact for a key.
    pub fn get_fact(&self, subject: &str, predicate: &str) -> Option<&Fact> {
        self.active
            .get(&FactKey::new(subject, predicate))
            .map(|&i| &self.facts[i])
    }

    /// Any record by id, whatever its status.
    pub fn get_fact_by_id(&self, id: &str) -> Option<&Fact> {
        self.by_id.get(id).map(|&i| &self.facts[i])
    }

    /// ACTIVE facts about one subject, ordered by predicate.
    pub fn get_subject_facts(&self, subject: &str) -> Vec<&Fact> {
        self.query(&FactFilter::new().subject(subject))
    }

    pub fn has(&self, subject: &str, predicate: &str) -> bool {
        self.get_fact(subject, predicate).is_some()
    }

    /// Every record in creation order.
    ///
    /// This read-only projection is what external query engines consume.
    pub fn all_facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Every version of one lineage, oldest first.
    pub fn history(&self, subject: &str, predicate: &str) -> Vec<&Fact> {
        self.lineages
            .get(&FactKey::new(subject, predicate))
            .map(|indices| indices.iter().map(|&i| &self.facts[i]).collect())
            .unwrap_or_default()
    }
}
