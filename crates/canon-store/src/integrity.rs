use std::collections::{HashMap, HashSet};

use canon_crypto::{verify_fact_hash, ChainError, HashChainVerifier};
use canon_types::{AuditAction, AuditEntry, Fact, FactKey, FactStatus};
use serde::Serialize;

use crate::store::CanonStore;

/// Outcome of [`CanonStore::verify_integrity`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub valid: bool,
    pub facts_checked: usize,
    pub audit_entries_checked: usize,
    /// One line per defect, in the order found.
    pub errors: Vec<String>,
}

impl CanonStore {
    /// Recheck every hash and link in the store.
    ///
    /// Never fails: every defect found is listed in the report.
    pub fn verify_integrity(&self) -> IntegrityReport {
        let mut errors = Vec::new();

        for fact in &self.facts {
            if !verify_fact_hash(fact) {
                errors.push(format!("hash mismatch for fact {}", fact.id));
            }
        }

        for err in HashChainVerifier::chain_breaks(&self.facts) {
            if matches!(err, ChainError::BrokenLink { .. }) {
                errors.push(format!("fact chain: {err}"));
            }
        }

        let tip = self.facts.last().map(|f| &f.hash);
        if tip.is_some_and(|h| h != &self.last_hash)
            || (tip.is_none() && !self.last_hash.is_genesis())
        {
            errors.push(format!("chain tip {} does not match the last fact", self.last_hash));
        }

        let mut active: HashMap<FactKey, &str> = HashMap::new();
        for fact in self.facts.iter().filter(|f| f.is_active()) {
            if let Some(other) = active.insert(fact.key(), &fact.id) {
                errors.push(format!(
                    "facts {other} and {} are both active for {}",
                    fact.id,
                    fact.key()
                ));
            }
        }

        for violation in self.audit.verify() {
            errors.push(format!("audit trail: {}", violation.description));
        }

        errors.extend(audit_disagreements(&self.facts, self.audit.entries()));

        for error in &errors {
            tracing::warn!(%error, "integrity violation");
        }

        IntegrityReport {
            valid: errors.is_empty(),
            facts_checked: self.facts.len(),
            audit_entries_checked: self.audit.len(),
            errors,
        }
    }
}

/// Facts whose existence or status is not backed by the audit trail.
///
/// Status sits outside the fact hash, so the hash-chained ARCHIVE and DELETE
/// entries are its only witness. Every fact must also have the CREATE or
/// UPDATE entry that introduced it.
pub(crate) fn audit_disagreements(facts: &[Fact], trail: &[AuditEntry]) -> Vec<String> {
    let mut introduced = HashSet::new();
    let mut retired: HashMap<&str, FactStatus> = HashMap::new();
    for entry in trail {
        match entry.action {
            AuditAction::Create | AuditAction::Update => {
                introduced.insert(entry.fact_id.as_str());
            }
            AuditAction::Archive => {
                retired.insert(entry.fact_id.as_str(), FactStatus::Archived);
            }
            AuditAction::Delete => {
                retired.insert(entry.fact_id.as_str(), FactStatus::Deleted);
            }
            AuditAction::Conflict => {}
        }
    }

    facts
        .iter()
        .filter_map(|fact| {
            if !introduced.contains(fact.id.as_str()) {
                return Some(format!("fact {} has no creation entry in the audit trail", fact.id));
            }
            let expected = retired
                .get(fact.id.as_str())
                .copied()
                .unwrap_or(FactStatus::Active);
            (fact.status != expected).then(|| {
                format!(
                    "fact {} is {} but the audit trail says {expected}",
                    fact.id, fact.status
                )
            })
        })
        .collect()
}
