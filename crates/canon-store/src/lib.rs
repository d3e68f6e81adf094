//! The Canon fact store.
//!
//! `canon-store` is the authoritative record of what is true in a story
//! world. It provides:
//! - Source-priority resolution of competing claims, with explicit conflicts
//!   for equal-priority disagreements
//! - An append-only, hash-chained fact table with per-key version lineages
//! - A hash-chained audit log of every mutation
//! - Merkle snapshots, snapshot diffs and inclusion proofs
//! - Verified export/import and a [`ByteSink`] boundary for persistence
//! - Whole-store integrity checks and metrics

pub mod config;
pub mod export;
pub mod integrity;
pub mod metrics;
pub mod query;
pub mod resolver;
pub mod sink;
pub mod snapshot;
pub mod store;
pub mod validate;

#[cfg(test)]
mod scenarios;

pub use canon_crypto::MerkleProof;
pub use canon_diff::{FactChange, FactDiff};
pub use config::CanonConfig;
pub use integrity::IntegrityReport;
pub use metrics::CanonMetrics;
pub use query::{FactFilter, StatusScope};
pub use sink::{ByteSink, FileSink, MemorySink, SinkError};
pub use store::CanonStore;
