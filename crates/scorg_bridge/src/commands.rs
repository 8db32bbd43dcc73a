//! Named commands behind the bridge and their JSON payloads.
//!
//! # Responsibility
//! - Decode `(command, payload_json)` pairs into typed [`Command`] values.
//! - Run a command against an open connection and describe the outcome.
//!
//! # Invariants
//! - Payload keys are snake_case; the camelCase spellings the UI sends are
//!   accepted as aliases.
//! - Handlers return `Err(String)` instead of panicking.

use scorg_core::{
    import_csv as import_csv_inner, parse_date, render_safmed_chart, ChartOptions, ScoreService,
    SqliteScoreRepository, SqliteStudentRepository, Student, StudentId, StudentService,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct FilterPayload {
    #[serde(default)]
    pub(crate) query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct NewStudentPayload {
    #[serde(alias = "firstNames")]
    pub(crate) first_names: String,
    #[serde(alias = "lastName")]
    pub(crate) last_name: String,
    #[serde(alias = "dateOfBirth")]
    pub(crate) date_of_birth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct StudentPayload {
    pub(crate) id: String,
    #[serde(alias = "firstNames")]
    pub(crate) first_names: String,
    #[serde(alias = "lastName")]
    pub(crate) last_name: String,
    #[serde(alias = "dateOfBirth")]
    pub(crate) date_of_birth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct EditStudentPayload {
    pub(crate) update: StudentPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct IdPayload {
    pub(crate) id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ScorePayload {
    #[serde(alias = "studentId", alias = "student_id")]
    pub(crate) id: String,
    pub(crate) date: String,
    pub(crate) correct: u32,
    pub(crate) incorrect: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct StudentIdPayload {
    #[serde(alias = "studentId", alias = "id")]
    pub(crate) student_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ImportPayload {
    #[serde(alias = "csv", alias = "data")]
    pub(crate) file: String,
}

/// Every operation the UI can invoke by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Ping,
    AllStudents,
    FilterStudents(FilterPayload),
    AddStudent(NewStudentPayload),
    EditStudent(EditStudentPayload),
    DeleteStudent(IdPayload),
    AddSafmedScore(ScorePayload),
    GetSafmedScores(StudentIdPayload),
    PlotSafmedScores(StudentIdPayload),
    ImportCsv(ImportPayload),
    LastStatus,
}

impl Command {
    /// Decodes a command name and its JSON payload.
    ///
    /// A blank payload is read as `{}`.
    pub(crate) fn parse(name: &str, payload_json: &str) -> Result<Self, String> {
        let payload = if payload_json.trim().is_empty() {
            "{}"
        } else {
            payload_json
        };

        let command = match name.trim() {
            "ping" => Self::Ping,
            "all_students" => Self::AllStudents,
            "filter_students" => Self::FilterStudents(decode(name, payload)?),
            "add_student" => Self::AddStudent(decode(name, payload)?),
            "edit_student" => Self::EditStudent(decode(name, payload)?),
            "delete_student" => Self::DeleteStudent(decode(name, payload)?),
            "add_safmed_score" => Self::AddSafmedScore(decode(name, payload)?),
            "get_safmed_scores" => Self::GetSafmedScores(decode(name, payload)?),
            "plot_safmed_scores" => Self::PlotSafmedScores(decode(name, payload)?),
            "import_csv" => Self::ImportCsv(decode(name, payload)?),
            "last_status" => Self::LastStatus,
            other => return Err(format!("unknown command `{other}`")),
        };
        Ok(command)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::AllStudents => "all_students",
            Self::FilterStudents(_) => "filter_students",
            Self::AddStudent(_) => "add_student",
            Self::EditStudent(_) => "edit_student",
            Self::DeleteStudent(_) => "delete_student",
            Self::AddSafmedScore(_) => "add_safmed_score",
            Self::GetSafmedScores(_) => "get_safmed_scores",
            Self::PlotSafmedScores(_) => "plot_safmed_scores",
            Self::ImportCsv(_) => "import_csv",
            Self::LastStatus => "last_status",
        }
    }

    /// Whether the command runs against the database.
    pub(crate) fn needs_db(&self) -> bool {
        !matches!(self, Self::Ping | Self::LastStatus)
    }
}

/// Whether `name` changes stored data. Mutations report to the status slot.
pub(crate) fn is_mutation(name: &str) -> bool {
    matches!(
        name.trim(),
        "add_student" | "edit_student" | "delete_student" | "add_safmed_score" | "import_csv"
    )
}

/// Successful command result before it is wrapped for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) data_json: Option<String>,
    pub(crate) message: String,
}

impl Outcome {
    fn with_data(data: &impl Serialize, message: impl Into<String>) -> Result<Self, String> {
        let data_json = serde_json::to_string(data)
            .map_err(|err| format!("failed to encode response: {err}"))?;
        Ok(Self {
            data_json: Some(data_json),
            message: message.into(),
        })
    }

    fn empty(message: impl Into<String>) -> Self {
        Self {
            data_json: None,
            message: message.into(),
        }
    }
}

/// Runs a database-backed command.
///
/// `Ping` and `LastStatus` are answered by the caller without a connection.
pub(crate) fn execute(conn: &mut Connection, command: &Command) -> Result<Outcome, String> {
    match command {
        Command::Ping | Command::LastStatus => {
            Err(format!("`{}` does not run against the database", command.name()))
        }
        Command::AllStudents => {
            let students = student_service(conn).all().map_err(|err| err.to_string())?;
            Outcome::with_data(
                &students,
                format!("Loaded {} student(s).", students.len()),
            )
        }
        Command::FilterStudents(payload) => {
            let students = student_service(conn)
                .filter(&payload.query)
                .map_err(|err| err.to_string())?;
            Outcome::with_data(
                &students,
                format!("{} student(s) match.", students.len()),
            )
        }
        Command::AddStudent(payload) => {
            let student = student_service(conn)
                .add_student(
                    &payload.first_names,
                    &payload.last_name,
                    &payload.date_of_birth,
                )
                .map_err(|err| err.to_string())?;
            Outcome::with_data(&student.id.to_string(), "Student added.")
        }
        Command::EditStudent(payload) => {
            let update = student_from_payload(&payload.update)?;
            student_service(conn)
                .edit_student(&update)
                .map_err(|err| err.to_string())?;
            Ok(Outcome::empty("Student updated."))
        }
        Command::DeleteStudent(payload) => {
            let id = parse_student_id(&payload.id)?;
            student_service(conn)
                .delete_student(id)
                .map_err(|err| err.to_string())?;
            Ok(Outcome::empty("Student deleted."))
        }
        Command::AddSafmedScore(payload) => {
            let id = parse_student_id(&payload.id)?;
            score_service(conn)
                .add_safmed_score(id, &payload.date, payload.correct, payload.incorrect)
                .map_err(|err| err.to_string())?;
            Ok(Outcome::empty("SAFMED score added."))
        }
        Command::GetSafmedScores(payload) => {
            let id = parse_student_id(&payload.student_id)?;
            let scores = score_service(conn)
                .safmed_scores(id)
                .map_err(|err| err.to_string())?;
            Outcome::with_data(&scores, format!("Loaded {} score(s).", scores.len()))
        }
        Command::PlotSafmedScores(payload) => {
            let id = parse_student_id(&payload.student_id)?;
            let student = student_service(conn).get(id).map_err(|err| err.to_string())?;
            let scores = score_service(conn)
                .safmed_scores(id)
                .map_err(|err| err.to_string())?;
            let svg = render_safmed_chart(&student, &scores, &ChartOptions::default())
                .map_err(|err| err.to_string())?;
            Outcome::with_data(&svg, format!("Plotted {} score(s).", scores.len()))
        }
        Command::ImportCsv(payload) => {
            let summary = import_csv_inner(conn, &payload.file).map_err(|err| err.to_string())?;
            Outcome::with_data(
                &summary,
                format!(
                    "Imported {} row(s): {} new student(s), {} score(s).",
                    summary.rows, summary.students_created, summary.scores_written
                ),
            )
        }
    }
}

fn student_service(conn: &Connection) -> StudentService<SqliteStudentRepository<'_>> {
    StudentService::new(SqliteStudentRepository::new(conn))
}

fn score_service(
    conn: &Connection,
) -> ScoreService<SqliteStudentRepository<'_>, SqliteScoreRepository<'_>> {
    ScoreService::new(
        SqliteStudentRepository::new(conn),
        SqliteScoreRepository::new(conn),
    )
}

fn student_from_payload(payload: &StudentPayload) -> Result<Student, String> {
    let id = parse_student_id(&payload.id)?;
    let date_of_birth = parse_date(&payload.date_of_birth).map_err(|err| err.to_string())?;
    Ok(Student::with_id(
        id,
        &payload.first_names,
        &payload.last_name,
        date_of_birth,
    ))
}

fn parse_student_id(raw: &str) -> Result<StudentId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid student id `{}`", raw.trim()))
}

fn decode<T: for<'de> Deserialize<'de>>(name: &str, payload: &str) -> Result<T, String> {
    serde_json::from_str(payload).map_err(|err| format!("invalid payload for `{name}`: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{execute, is_mutation, Command, ImportPayload, ScorePayload, StudentIdPayload};
    use scorg_core::open_db_in_memory;

    const SHEET: &str = "first_names,last_name,date_of_birth,2021-02-01,2021-02-02\n\
                         Ben,Jones,1990-01-23,89/23,91/20\n";

    #[test]
    fn parse_accepts_camel_case_aliases() {
        let command = Command::parse(
            "add_safmed_score",
            r#"{"studentId":"00000000-0000-0000-0000-000000000000","date":"2021-02-01","correct":3,"incorrect":1}"#,
        )
        .unwrap();
        assert_eq!(
            command,
            Command::AddSafmedScore(ScorePayload {
                id: "00000000-0000-0000-0000-000000000000".to_string(),
                date: "2021-02-01".to_string(),
                correct: 3,
                incorrect: 1,
            })
        );

        let plot = Command::parse("plot_safmed_scores", r#"{"studentId":"abc"}"#).unwrap();
        assert_eq!(
            plot,
            Command::PlotSafmedScores(StudentIdPayload {
                student_id: "abc".to_string()
            })
        );
    }

    #[test]
    fn parse_rejects_unknown_command_and_bad_payload() {
        let unknown = Command::parse("get_scores_plot", "").unwrap_err();
        assert!(unknown.contains("unknown command"));

        let bad = Command::parse("add_student", r#"{"firstNames":"Ben"}"#).unwrap_err();
        assert!(bad.contains("invalid payload for `add_student`"));
    }

    #[test]
    fn blank_payload_reads_as_empty_object() {
        assert_eq!(Command::parse("all_students", "  ").unwrap(), Command::AllStudents);
        assert!(matches!(
            Command::parse("filter_students", ""),
            Ok(Command::FilterStudents(payload)) if payload.query.is_empty()
        ));
    }

    #[test]
    fn only_writes_count_as_mutations() {
        assert!(is_mutation("add_student"));
        assert!(is_mutation("import_csv"));
        assert!(!is_mutation("all_students"));
        assert!(!is_mutation("plot_safmed_scores"));
    }

    #[test]
    fn import_then_list_then_plot() {
        let mut conn = open_db_in_memory().unwrap();

        let imported = execute(
            &mut conn,
            &Command::ImportCsv(ImportPayload {
                file: SHEET.to_string(),
            }),
        )
        .unwrap();
        assert!(imported.message.contains("1 new student(s)"));

        let listed = execute(&mut conn, &Command::AllStudents).unwrap();
        let students: Vec<serde_json::Value> =
            serde_json::from_str(listed.data_json.as_deref().unwrap()).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0]["first_names"], "Ben");
        assert_eq!(students[0]["date_of_birth"], "1990-01-23");
        let id = students[0]["id"].as_str().unwrap().to_string();

        let scores = execute(
            &mut conn,
            &Command::GetSafmedScores(StudentIdPayload {
                student_id: id.clone(),
            }),
        )
        .unwrap();
        let scores: Vec<serde_json::Value> =
            serde_json::from_str(scores.data_json.as_deref().unwrap()).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0]["id"], id.as_str());
        assert_eq!(scores[0]["date"], "2021-02-01");

        let plot = execute(
            &mut conn,
            &Command::PlotSafmedScores(StudentIdPayload { student_id: id }),
        )
        .unwrap();
        let svg: String = serde_json::from_str(plot.data_json.as_deref().unwrap()).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn invalid_student_id_is_reported() {
        let mut conn = open_db_in_memory().unwrap();
        let err = execute(
            &mut conn,
            &Command::GetSafmedScores(StudentIdPayload {
                student_id: "not-a-uuid".to_string(),
            }),
        )
        .unwrap_err();
        assert_eq!(err, "invalid student id `not-a-uuid`");
    }
}
