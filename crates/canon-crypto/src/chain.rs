use canon_types::{AuditEntry, ContentHash, Fact};

use crate::hasher::{hash_audit_entry, hash_fact, HashError};

/// Trait for records that participate in a hash chain.
pub trait ChainLink {
    /// The record's stored hash.
    fn link_hash(&self) -> &ContentHash;
    /// The stored hash of the previous record (genesis for the first).
    fn prev_link(&self) -> &ContentHash;
    /// Recompute the record's hash from its content.
    fn recompute(&self) -> Result<ContentHash, HashError>;
    /// Identifier used in error reports.
    fn label(&self) -> &str;
}

impl ChainLink for Fact {
    fn link_hash(&self) -> &ContentHash {
        &self.hash
    }
    fn prev_link(&self) -> &ContentHash {
        &self.previous_hash
    }
    fn recompute(&self) -> Result<ContentHash, HashError> {
        hash_fact(self)
    }
    fn label(&self) -> &str {
        &self.id
    }
}

impl ChainLink for AuditEntry {
    fn link_hash(&self) -> &ContentHash {
        &self.hash
    }
    fn prev_link(&self) -> &ContentHash {
        &self.previous_hash
    }
    fn recompute(&self) -> Result<ContentHash, HashError> {
        hash_audit_entry(self)
    }
    fn label(&self) -> &str {
        &self.id
    }
}

/// Hash chain integrity verifier.
///
/// A sequence of records forms a valid chain when the first record's
/// previous hash is the genesis hash, every later record's previous hash is
/// the stored hash of the record before it, and every stored hash matches
/// the record's recomputed content hash.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain, stopping at the first defect.
    pub fn verify_chain<L: ChainLink>(links: &[L]) -> Result<(), ChainError> {
        match Self::chain_breaks(links).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every defect in the chain, in record order.
    ///
    /// For each record the link is checked before the content hash.
    pub fn chain_breaks<L: ChainLink>(links: &[L]) -> Vec<ChainError> {
        let mut errors = Vec::new();
        let genesis = ContentHash::genesis();
        let mut expected_prev = &genesis;

        for (index, link) in links.iter().enumerate() {
            if link.prev_link() != expected_prev {
                errors.push(ChainError::BrokenLink {
                    index,
                    id: link.label().to_string(),
                    expected: expected_prev.clone(),
                    actual: link.prev_link().clone(),
                });
            }

            match link.recompute() {
                Ok(computed) if &computed == link.link_hash() => {}
                Ok(computed) => errors.push(ChainError::HashMismatch {
                    index,
                    id: link.label().to_string(),
                    expected: link.link_hash().clone(),
                    actual: computed,
                }),
                Err(err) => errors.push(ChainError::Unhashable {
                    index,
                    id: link.label().to_string(),
                    reason: err.to_string(),
                }),
            }

            expected_prev = link.link_hash();
        }

        errors
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("broken link at index {index} ({id}): previous hash {actual} does not match {expected}")]
    BrokenLink {
        index: usize,
        id: String,
        expected: ContentHash,
        actual: ContentHash,
    },

    #[error("hash mismatch at index {index} ({id}): stored {expected}, computed {actual}")]
    HashMismatch {
        index: usize,
        id: String,
        expected: ContentHash,
        actual: ContentHash,
    },

    #[error("cannot hash record at index {index} ({id}): {reason}")]
    Unhashable {
        index: usize,
        id: String,
        reason: String,
    },
}

impl ChainError {
    pub fn index(&self) -> usize {
        match self {
            Self::BrokenLink { index, .. }
            | Self::HashMismatch { index, .. }
            | Self::Unhashable { index, .. } => *index,
        }
    }

    /// Identifier of the offending record.
    pub fn id(&self) -> &str {
        match self {
            Self::BrokenLink { id, .. } | Self::HashMismatch { id, .. } | Self::Unhashable { id, .. } => id,
        }
    }
}
