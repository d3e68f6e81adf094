//! Integrity primitives for Canon.
//!
//! Provides the canonical JSON encoder every hash is computed over, SHA-256
//! content hashing of facts, audit entries and exports, binary Merkle trees
//! with inclusion proofs, and hash chain verification.
//!
//! All digests are SHA-256 from the `sha2` crate; nothing here is custom
//! cryptography.

pub mod canonical;
pub mod chain;
pub mod hasher;
pub mod merkle;

pub use canonical::{canonical_json, canonicalize};
pub use chain::{ChainError, ChainLink, HashChainVerifier};
pub use hasher::{
    hash_audit_entry, hash_canonical, hash_export, hash_fact, sha256_hex, verify_audit_hash,
    verify_fact_hash, HashError,
};
pub use merkle::{compute_merkle_root, MerkleProof, MerkleTree, Side};
