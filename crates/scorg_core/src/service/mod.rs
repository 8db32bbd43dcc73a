//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep bridge/CLI layers decoupled from storage details.

pub mod score_service;
pub mod student_service;
