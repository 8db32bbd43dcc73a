//! Domain model for students and their assessment scores.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules next to the types they protect.
//!
//! # Invariants
//! - Every student is identified by a stable `StudentId`.
//! - Scores reference students by id and never embed student data.

pub mod score;
pub mod student;
