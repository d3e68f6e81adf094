//! Diffing for Canon fact sets.
//!
//! A Canon state is the set of ACTIVE facts keyed by `(subject, predicate)`.
//! Comparing two states yields the keys that appeared, the keys that
//! disappeared, and the keys whose winning fact was replaced.

pub mod fact_diff;

pub use fact_diff::{diff_fact_sets, FactChange, FactDiff, FactState};
