//! FFI use-case API for UI-facing calls.
//!
//! # Responsibility
//! - Expose one string-named `dispatch` entry point plus typed per-command
//!   functions to the UI shell via FRB.
//! - Record the outcome of every mutation in the process-wide status slot.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures come back as `ok=false` envelopes with a readable message.
//! - The database path is resolved once per process.

use crate::commands::{
    execute, is_mutation, Command, EditStudentPayload, FilterPayload, IdPayload, ImportPayload,
    NewStudentPayload, Outcome, ScorePayload, StudentIdPayload, StudentPayload,
};
use log::{info, warn};
use scorg_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    init_logging_from_config, open_db, ping as ping_inner, ScorgConfig, StatusLevel,
    StatusMessage, StatusSlot,
};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;

const FALLBACK_DB_FILE_NAME: &str = "scorg.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STATUS: StatusSlot = StatusSlot::new();

/// Response envelope shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    /// Whether the command succeeded.
    pub ok: bool,
    /// JSON-encoded result, when the command returns data.
    pub data_json: Option<String>,
    /// Human-readable outcome for the status bar.
    pub message: String,
    /// `info|success|error`.
    pub level: String,
}

impl CommandResponse {
    fn success(outcome: Outcome, level: StatusLevel) -> Self {
        Self {
            ok: true,
            data_json: outcome.data_json,
            message: outcome.message,
            level: level.as_str().to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data_json: None,
            message: message.into(),
            level: StatusLevel::Error.as_str().to_string(),
        }
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// Returns an empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Initializes logging from `SCORG_LOG_LEVEL` / `SCORG_LOG_DIR` defaults.
#[flutter_rust_bridge::frb(sync)]
pub fn init_default_logging() -> String {
    let result = ScorgConfig::from_env()
        .map_err(|err| err.to_string())
        .and_then(|config| init_logging_from_config(&config));
    match result {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Runs the command named `command` with a JSON payload.
///
/// # FFI contract
/// - Sync call, DB-backed execution for data commands.
/// - Unknown commands and malformed payloads return `ok=false`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn dispatch(command: String, payload_json: String) -> CommandResponse {
    dispatch_with(&STATUS, &command, &payload_json)
}

fn dispatch_with(status: &StatusSlot, command: &str, payload_json: &str) -> CommandResponse {
    match Command::parse(command, payload_json) {
        Ok(parsed) => run_with(status, parsed),
        Err(err) => {
            warn!(
                "event=command_decode module=bridge status=error command={}",
                command.trim()
            );
            if is_mutation(command) {
                status.post(StatusMessage::new(StatusLevel::Error, err.clone()));
            }
            CommandResponse::failure(err)
        }
    }
}

/// Lists every student in list order.
#[flutter_rust_bridge::frb(sync)]
pub fn all_students() -> CommandResponse {
    run(Command::AllStudents)
}

/// Lists students whose display name contains `query`.
#[flutter_rust_bridge::frb(sync)]
pub fn filter_students(query: String) -> CommandResponse {
    run(Command::FilterStudents(FilterPayload { query }))
}

/// Creates a student; `data_json` holds the new id.
#[flutter_rust_bridge::frb(sync)]
pub fn add_student(first_names: String, last_name: String, date_of_birth: String) -> CommandResponse {
    run(Command::AddStudent(NewStudentPayload {
        first_names,
        last_name,
        date_of_birth,
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn edit_student(
    id: String,
    first_names: String,
    last_name: String,
    date_of_birth: String,
) -> CommandResponse {
    run(Command::EditStudent(EditStudentPayload {
        update: StudentPayload {
            id,
            first_names,
            last_name,
            date_of_birth,
        },
    }))
}

/// Deletes a student and all of its scores.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_student(id: String) -> CommandResponse {
    run(Command::DeleteStudent(IdPayload { id }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_safmed_score(id: String, date: String, correct: u32, incorrect: u32) -> CommandResponse {
    run(Command::AddSafmedScore(ScorePayload {
        id,
        date,
        correct,
        incorrect,
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_safmed_scores(student_id: String) -> CommandResponse {
    run(Command::GetSafmedScores(StudentIdPayload { student_id }))
}

/// Renders the student's SAFMED chart; `data_json` holds the SVG markup.
#[flutter_rust_bridge::frb(sync)]
pub fn plot_safmed_scores(student_id: String) -> CommandResponse {
    run(Command::PlotSafmedScores(StudentIdPayload { student_id }))
}

/// Imports CSV text; `data_json` holds the import summary.
#[flutter_rust_bridge::frb(sync)]
pub fn import_csv(file: String) -> CommandResponse {
    run(Command::ImportCsv(ImportPayload { file }))
}

/// Returns and clears the latest status message (`null` when none).
#[flutter_rust_bridge::frb(sync)]
pub fn last_status() -> CommandResponse {
    run(Command::LastStatus)
}

fn run(command: Command) -> CommandResponse {
    run_with(&STATUS, command)
}

/// Executes `command` and records mutation outcomes in `status`.
fn run_with(status: &StatusSlot, command: Command) -> CommandResponse {
    let started_at = Instant::now();
    let name = command.name();

    let result = match &command {
        Command::Ping => Ok(Outcome {
            data_json: Some(format!("\"{}\"", ping_inner())),
            message: "pong".to_string(),
        }),
        Command::LastStatus => last_status_outcome(status),
        _ => with_connection(|conn| execute(conn, &command)),
    };

    let mutation = is_mutation(name);
    match result {
        Ok(outcome) => {
            info!(
                "event=command module=bridge status=ok command={name} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            let level = if mutation {
                StatusLevel::Success
            } else {
                StatusLevel::Info
            };
            if mutation {
                status.post(StatusMessage::new(level, outcome.message.clone()));
            }
            CommandResponse::success(outcome, level)
        }
        Err(err) => {
            warn!(
                "event=command module=bridge status=error command={name} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            let message = format!("{name} failed: {err}");
            if mutation {
                status.post(StatusMessage::new(StatusLevel::Error, message.clone()));
            }
            CommandResponse::failure(message)
        }
    }
}

fn last_status_outcome(status: &StatusSlot) -> Result<Outcome, String> {
    let current = status.take();
    let data_json = serde_json::to_string(&current)
        .map_err(|err| format!("failed to encode status: {err}"))?;
    let message = current
        .map(|status| status.text)
        .unwrap_or_else(|| "Idle".to_string());
    Ok(Outcome {
        data_json: Some(data_json),
        message,
    })
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| match ScorgConfig::from_env() {
            Ok(config) => config.db_path,
            Err(err) => {
                warn!("event=config_load module=bridge status=error error={err}");
                std::env::temp_dir().join(FALLBACK_DB_FILE_NAME)
            }
        })
        .clone()
}

fn with_connection<T>(
    f: impl FnOnce(&mut rusqlite::Connection) -> Result<T, String>,
) -> Result<T, String> {
    let db_path = resolve_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create `{}`: {err}", parent.display()))?;
    }
    let mut conn = open_db(&db_path).map_err(|err| format!("DB open failed: {err}"))?;
    f(&mut conn)
}
