//! Core domain logic for the student score tracker.
//! Owns students, SAFMED scores, persistence, CSV import, and charting.

pub mod config;
pub mod dates;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod plot;
pub mod repo;
pub mod search;
pub mod service;
pub mod status;

pub use config::{ConfigError, ScorgConfig};
pub use dates::{format_date, parse_date, DateParseError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use import::csv_import::{import_csv, ImportError, ImportResult, ImportSummary};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::score::{AssessmentKind, SafmedScore, ScoreValidationError};
pub use model::student::{Student, StudentId, StudentValidationError};
pub use plot::safmed_chart::{render_safmed_chart, ChartOptions, PlotError, PlotResult};
pub use repo::score_repo::{ScoreRepository, SqliteScoreRepository};
pub use repo::student_repo::{RepoError, RepoResult, SqliteStudentRepository, StudentRepository};
pub use search::filter::filter_students;
pub use service::score_service::ScoreService;
pub use service::student_service::{ServiceError, ServiceResult, StudentService};
pub use status::{StatusLevel, StatusMessage, StatusSlot};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
