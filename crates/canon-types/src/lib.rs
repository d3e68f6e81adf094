//! Foundation types for Canon, the authoritative fact store.
//!
//! Every other Canon crate depends on `canon-types`. It defines the records the
//! store persists and exchanges, plus the single error type its public API returns.
//!
//! # Key Types
//!
//! - [`Fact`]: one subject/predicate/value assertion with provenance and status
//! - [`FactSource`]: provenance kind, carrying the source priority order
//! - [`Conflict`]: an unresolved tie between equal-priority claims
//! - [`AuditEntry`]: one hash-chained entry of the audit log
//! - [`Snapshot`] / [`ExportBlob`]: Merkle commitment and full-state export
//! - [`ContentHash`]: 64-character hex SHA-256 digest
//! - [`Clock`]: injected time source

pub mod audit;
pub mod conflict;
pub mod error;
pub mod fact;
pub mod hash;
pub mod snapshot;
pub mod temporal;

pub use audit::{AuditAction, AuditContent, AuditEntry};
pub use conflict::{Conflict, ConflictResolution, ResolutionChoice};
pub use error::{CanonError, CanonErrorCode, CanonResult, ErrorDetails};
pub use fact::{
    Confidence, Fact, FactContent, FactInput, FactKey, FactMetadata, FactPatch, FactSource,
    FactStatus, FactType, SourcePosition,
};
pub use hash::{ContentHash, GENESIS_HASH, GENESIS_MARKER};
pub use snapshot::{ExportBlob, ExportPayload, Snapshot, CANON_MAGIC, CANON_VERSION};
pub use temporal::{Clock, ManualClock, SystemClock};
