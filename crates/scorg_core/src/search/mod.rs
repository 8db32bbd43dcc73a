//! Student list search entry points.
//!
//! # Responsibility
//! - Provide the type-as-you-search predicate used by the student list.

pub mod filter;
