use std::collections::HashSet;

use canon_crypto::{compute_merkle_root, sha256_hex, MerkleProof, MerkleTree};
use canon_diff::{diff_fact_sets, FactDiff, FactState};
use canon_types::{
    AuditAction, CanonError, CanonErrorCode, CanonResult, ContentHash, Fact, FactStatus,
    Snapshot, CANON_VERSION,
};

use crate::store::CanonStore;

impl CanonStore {
    /// Commit to the current fact table.
    ///
    /// The root covers every record, whatever its status, with leaves
    /// ordered by fact id.
    pub fn create_snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let root_hash = self.root_at(self.facts.len());
        let audit_head = self.audit.head();
        let seed = format!("{root_hash}:{audit_head}:{}", now.to_rfc3339());

        let snapshot = Snapshot {
            id: format!(
                "snap_{}_{}",
                now.format("%Y%m%d%H%M%S"),
                &sha256_hex(seed.as_bytes())[..8]
            ),
            timestamp: now,
            fact_count: self.facts.len(),
            root_hash,
            last_fact_hash: self.last_hash.clone(),
            audit_head,
            audit_sequence: self.audit.sequence(),
            version: CANON_VERSION.to_string(),
        };
        tracing::info!(
            snapshot = %snapshot.id,
            facts = snapshot.fact_count,
            root = %snapshot.root_hash.short(),
            "snapshot created"
        );
        snapshot
    }

    /// Merkle root of the current fact table.
    pub fn current_root_hash(&self) -> ContentHash {
        self.root_at(self.facts.len())
    }

    /// Changes to the ACTIVE fact set since `snapshot` was taken.
    ///
    /// Fails with `INTEGRITY_VIOLATION` when the snapshot does not commit to
    /// a prefix of this store's history.
    pub fn diff(&self, snapshot: &Snapshot) -> CanonResult<FactDiff> {
        self.check_snapshot(snapshot)?;
        let before = self.state_at(snapshot);
        let after: FactState = self
            .active
            .values()
            .map(|&i| (self.facts[i].key(), self.facts[i].clone()))
            .collect();
        Ok(diff_fact_sets(&before, &after))
    }

    /// Inclusion proof that a fact hash is committed by `snapshot`'s root.
    pub fn prove_fact(&self, fact_id: &str, snapshot: &Snapshot) -> CanonResult<MerkleProof> {
        self.check_snapshot(snapshot)?;
        let index = self.by_id.get(fact_id).copied().ok_or_else(|| {
            CanonError::new(CanonErrorCode::FactNotFound, format!("no fact with id {fact_id}"))
                .with_fact(fact_id)
        })?;
        if index >= snapshot.fact_count {
            return Err(CanonError::new(
                CanonErrorCode::FactNotFound,
                format!("fact {fact_id} was created after snapshot {}", snapshot.id),
            )
            .with_fact(fact_id));
        }

        let tree = MerkleTree::from_leaves(self.leaves(snapshot.fact_count));
        tree.position(&self.facts[index].hash)
            .and_then(|position| tree.proof(position))
            .ok_or_else(|| {
                CanonError::new(
                    CanonErrorCode::IntegrityViolation,
                    format!("fact {fact_id} is not a leaf of snapshot {}", snapshot.id),
                )
                .with_fact(fact_id)
            })
    }

    /// Fact hashes of the first `count` records, ordered by id.
    fn leaves(&self, count: usize) -> Vec<ContentHash> {
        let mut prefix: Vec<&Fact> = self.facts.iter().take(count).collect();
        prefix.sort_by(|a, b| a.id.cmp(&b.id));
        prefix.into_iter().map(|f| f.hash.clone()).collect()
    }

    pub(crate) fn root_at(&self, count: usize) -> ContentHash {
        compute_merkle_root(&self.leaves(count))
    }

    fn check_snapshot(&self, snapshot: &Snapshot) -> CanonResult<()> {
        let fits = snapshot.fact_count <= self.facts.len()
            && snapshot.audit_sequence <= self.audit.sequence();
        if !fits {
            return Err(CanonError::new(
                CanonErrorCode::IntegrityViolation,
                format!("snapshot {} is ahead of this store", snapshot.id),
            ));
        }
        let root = self.root_at(snapshot.fact_count);
        if root != snapshot.root_hash {
            return Err(CanonError::new(
                CanonErrorCode::IntegrityViolation,
                format!("snapshot {} does not match this store's history", snapshot.id),
            )
            .with_hashes(snapshot.root_hash.clone(), root));
        }
        Ok(())
    }

    /// ACTIVE facts as of the snapshot's cut points.
    fn state_at(&self, snapshot: &Snapshot) -> FactState {
        let retired: HashSet<&str> = self
            .audit
            .entries()
            .iter()
            .take_while(|e| e.sequence <= snapshot.audit_sequence)
            .filter(|e| matches!(e.action, AuditAction::Archive | AuditAction::Delete))
            .map(|e| e.fact_id.as_str())
            .collect();

        self.facts
            .iter()
            .take(snapshot.fact_count)
            .filter(|f| !retired.contains(f.id.as_str()))
            .map(|f| {
                let mut fact = f.clone();
                fact.status = FactStatus::Active;
                (fact.key(), fact)
            })
            .collect()
    }
}
