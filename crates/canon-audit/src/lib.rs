//! Hash-chained audit log for Canon.
//!
//! Every mutation of a Canon store appends one or more entries here. Each
//! entry carries a 1-based sequence number, the hash of its own content, and
//! the hash of the entry before it, so any edit, insertion or removal breaks
//! the chain and is reported by [`AuditLog::verify`].

pub mod error;
pub mod log;
pub mod validation;

pub use error::{AuditError, AuditResult};
pub use log::{AuditLog, AuditRecord};
pub use validation::{AuditValidator, Violation, ViolationKind};
