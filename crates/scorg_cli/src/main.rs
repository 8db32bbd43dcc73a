//! `scorg` command-line front-end.
//!
//! # Responsibility
//! - Run the same student and score use cases as the bridge from a terminal.
//! - Print results to stdout and failures to stderr with a non-zero exit.

use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rusqlite::Connection;
use scorg_core::{
    format_date, import_csv, init_logging, open_db, parse_date, render_safmed_chart,
    ChartOptions, ScoreService, ScorgConfig, SqliteScoreRepository, SqliteStudentRepository,
    StudentService,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use uuid::Uuid;

type CliResult = Result<(), String>;

#[derive(Debug, Parser)]
#[command(name = "scorg", version, about = "Track students and their SAFMED scores")]
struct Cli {
    /// Database file (default: platform data dir)
    #[arg(long, global = true, env = "SCORG_DB_PATH")]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// List students, optionally filtered by name
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Add a student
    Add {
        #[arg(short, long)]
        first_names: String,
        #[arg(short, long)]
        last_name: String,
        /// YYYY-MM-DD
        #[arg(short, long)]
        date_of_birth: String,
    },
    /// Change a student's names or date of birth
    Edit {
        #[arg(long)]
        id: Uuid,
        #[arg(short, long)]
        first_names: Option<String>,
        #[arg(short, long)]
        last_name: Option<String>,
        #[arg(short, long)]
        date_of_birth: Option<String>,
    },
    /// Delete a student and all of their scores
    Delete {
        #[arg(short, long)]
        first_names: String,
        #[arg(short, long)]
        last_name: String,
    },
    /// Record scores
    Score {
        #[command(subcommand)]
        command: ScoreCommand,
    },
    /// Show a student's SAFMED scores, oldest first
    Scores {
        #[arg(long)]
        id: Uuid,
    },
    /// Import a class sheet CSV
    Import { path: PathBuf },
    /// Write a student's SAFMED chart as SVG
    Plot {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        out: PathBuf,
    },
}

impl CliCommand {
    /// Stable name used in log events.
    fn name(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Add { .. } => "add",
            Self::Edit { .. } => "edit",
            Self::Delete { .. } => "delete",
            Self::Score {
                command: ScoreCommand::Add(_),
            } => "score_add",
            Self::Scores { .. } => "scores",
            Self::Import { .. } => "import",
            Self::Plot { .. } => "plot",
        }
    }
}

#[derive(Debug, Subcommand)]
enum ScoreCommand {
    /// Add one SAFMED result
    Add(ScoreArgs),
}

#[derive(Debug, Args)]
struct ScoreArgs {
    #[arg(long)]
    id: Uuid,
    /// YYYY-MM-DD
    #[arg(long)]
    date: String,
    #[arg(long)]
    correct: u32,
    #[arg(long)]
    incorrect: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult {
    let mut config = ScorgConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.ensure_dirs().map_err(|err| err.to_string())?;
    if let Err(err) = init_logging(&config.log_level, &config.log_dir_str()) {
        eprintln!("warning: logging disabled: {err}");
    }

    let mut conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let name = cli.command.name();
    let started_at = Instant::now();
    let result = execute(cli.command, &mut conn);
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(()) => {
            info!("event=cli_command module=cli status=ok command={name} duration_ms={duration_ms}")
        }
        // Error text can carry student names; keep it out of the log.
        Err(_) => warn!(
            "event=cli_command module=cli status=error command={name} duration_ms={duration_ms}"
        ),
    }
    result
}

fn execute(command: CliCommand, conn: &mut Connection) -> CliResult {
    let students = StudentService::new(SqliteStudentRepository::new(conn));
    let scores = ScoreService::new(
        SqliteStudentRepository::new(conn),
        SqliteScoreRepository::new(conn),
    );

    match command {
        CliCommand::List { filter } => {
            let listed = students
                .filter(filter.as_deref().unwrap_or_default())
                .map_err(|err| err.to_string())?;
            for student in listed {
                println!(
                    "{}\t{}\t{}",
                    student.id,
                    student.display_name(),
                    format_date(student.date_of_birth)
                );
            }
            Ok(())
        }
        CliCommand::Add {
            first_names,
            last_name,
            date_of_birth,
        } => {
            let student = students
                .add_student(&first_names, &last_name, &date_of_birth)
                .map_err(|err| err.to_string())?;
            println!("{}", student.id);
            Ok(())
        }
        CliCommand::Edit {
            id,
            first_names,
            last_name,
            date_of_birth,
        } => {
            let mut student = students.get(id).map_err(|err| err.to_string())?;
            if let Some(first_names) = first_names {
                student.first_names = first_names;
            }
            if let Some(last_name) = last_name {
                student.last_name = last_name;
            }
            if let Some(raw) = date_of_birth {
                student.date_of_birth = parse_date(&raw).map_err(|err| err.to_string())?;
            }
            students
                .edit_student(&student)
                .map_err(|err| err.to_string())
        }
        CliCommand::Delete {
            first_names,
            last_name,
        } => {
            let id = students
                .id_for_name(&first_names, &last_name)
                .map_err(|err| err.to_string())?;
            students.delete_student(id).map_err(|err| err.to_string())
        }
        CliCommand::Score {
            command: ScoreCommand::Add(args),
        } => scores
            .add_safmed_score(args.id, &args.date, args.correct, args.incorrect)
            .map(|_| ())
            .map_err(|err| err.to_string()),
        CliCommand::Scores { id } => {
            for score in scores.safmed_scores(id).map_err(|err| err.to_string())? {
                println!(
                    "{}\t{}\t{}",
                    format_date(score.date),
                    score.correct,
                    score.incorrect
                );
            }
            Ok(())
        }
        CliCommand::Import { path } => {
            let data = std::fs::read_to_string(&path)
                .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
            let summary = import_csv(conn, &data).map_err(|err| err.to_string())?;
            println!(
                "imported {} row(s): {} new student(s), {} matched, {} score(s)",
                summary.rows,
                summary.students_created,
                summary.students_matched,
                summary.scores_written
            );
            Ok(())
        }
        CliCommand::Plot { id, out } => {
            let student = students.get(id).map_err(|err| err.to_string())?;
            let history = scores.safmed_scores(id).map_err(|err| err.to_string())?;
            let svg = render_safmed_chart(&student, &history, &ChartOptions::default())
                .map_err(|err| err.to_string())?;
            std::fs::write(&out, svg)
                .map_err(|err| format!("failed to write `{}`: {err}", out.display()))
        }
    }
}
