//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `students` table.
//! - Translate SQLite constraint failures into semantic repository errors.
//!
//! # Invariants
//! - Write paths must call `Student::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - Deleting a student removes its scores through `ON DELETE CASCADE`.

use crate::dates::{format_date, parse_date};
use crate::db::DbError;
use crate::model::score::ScoreValidationError;
use crate::model::student::{Student, StudentId, StudentValidationError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const STUDENT_SELECT_SQL: &str = "SELECT
    uuid,
    first_names,
    last_name,
    date_of_birth
FROM students";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by student and score persistence.
#[derive(Debug)]
pub enum RepoError {
    InvalidStudent(StudentValidationError),
    InvalidScore(ScoreValidationError),
    Db(DbError),
    NotFound(StudentId),
    /// A uniqueness constraint rejected the write.
    Duplicate(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStudent(err) => write!(f, "{err}"),
            Self::InvalidScore(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "student not found: {id}"),
            Self::Duplicate(message) => write!(f, "{message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidStudent(err) => Some(err),
            Self::InvalidScore(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Duplicate(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<StudentValidationError> for RepoError {
    fn from(value: StudentValidationError) -> Self {
        Self::InvalidStudent(value)
    }
}

impl From<ScoreValidationError> for RepoError {
    fn from(value: ScoreValidationError) -> Self {
        Self::InvalidScore(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for student CRUD operations.
pub trait StudentRepository {
    fn create_student(&self, student: &Student) -> RepoResult<StudentId>;
    fn update_student(&self, student: &Student) -> RepoResult<()>;
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Exact match on trimmed names.
    fn find_student_id_by_name(
        &self,
        first_names: &str,
        last_name: &str,
    ) -> RepoResult<Option<StudentId>>;
    /// Sorted by last name, then first names (case-insensitive), then id.
    fn list_students(&self) -> RepoResult<Vec<Student>>;
    fn delete_student(&self, id: StudentId) -> RepoResult<()>;
}

/// SQLite-backed student repository.
///
/// Borrowing a `Transaction` works too, since it derefs to `Connection`.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create_student(&self, student: &Student) -> RepoResult<StudentId> {
        student.validate()?;

        self.conn
            .execute(
                "INSERT INTO students (
                    uuid,
                    first_names,
                    last_name,
                    date_of_birth
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    student.id.to_string(),
                    student.first_names.as_str(),
                    student.last_name.as_str(),
                    format_date(student.date_of_birth),
                ],
            )
            .map_err(|err| map_unique_violation(err, student))?;

        Ok(student.id)
    }

    fn update_student(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE students
                 SET
                    first_names = ?1,
                    last_name = ?2,
                    date_of_birth = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?4;",
                params![
                    student.first_names.as_str(),
                    student.last_name.as_str(),
                    format_date(student.date_of_birth),
                    student.id.to_string(),
                ],
            )
            .map_err(|err| map_unique_violation(err, student))?;

        if changed == 0 {
            return Err(RepoError::NotFound(student.id));
        }

        Ok(())
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }

        Ok(None)
    }

    fn find_student_id_by_name(
        &self,
        first_names: &str,
        last_name: &str,
    ) -> RepoResult<Option<StudentId>> {
        let uuid_text: Option<String> = self
            .conn
            .query_row(
                "SELECT uuid FROM students WHERE first_names = ?1 AND last_name = ?2;",
                params![first_names.trim(), last_name.trim()],
                |row| row.get(0),
            )
            .optional()?;

        uuid_text.map(|text| parse_uuid(&text)).transpose()
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL}
             ORDER BY last_name COLLATE NOCASE ASC,
                      first_names COLLATE NOCASE ASC,
                      uuid ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }

        Ok(students)
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text)?;

    let dob_text: String = row.get("date_of_birth")?;
    let date_of_birth = parse_date(&dob_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{dob_text}` in students.date_of_birth"
        ))
    })?;

    Ok(Student {
        id,
        first_names: row.get("first_names")?,
        last_name: row.get("last_name")?,
        date_of_birth,
    })
}

pub(crate) fn parse_uuid(text: &str) -> RepoResult<StudentId> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}`")))
}

fn map_unique_violation(err: rusqlite::Error, student: &Student) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::Duplicate(format!(
            "a student named `{}` already exists",
            student.display_name()
        ));
    }
    err.into()
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        }
        _ => false,
    }
}
