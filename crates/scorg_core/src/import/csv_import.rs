//! CSV roster + SAFMED score import.
//!
//! # Responsibility
//! - Parse a class sheet (`first_names,last_name,date_of_birth,<date>...`).
//! - Match rows to existing students by exact name, creating the rest.
//! - Write students and scores in a single transaction.
//!
//! # Invariants
//! - Any parse or persistence error leaves the database unchanged.
//! - Re-importing the same sheet is idempotent: scores are upserted.
//! - Blank score cells mean "no drill that day" and are skipped.

use crate::dates::{parse_date, DateParseError};
use crate::model::score::SafmedScore;
use crate::model::student::{Student, StudentId};
use crate::repo::score_repo::{ScoreRepository, SqliteScoreRepository};
use crate::repo::student_repo::{RepoError, SqliteStudentRepository, StudentRepository};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Number of leading identity columns before score columns begin.
const IDENTITY_COLUMNS: usize = 3;

pub type ImportResult<T> = Result<T, ImportError>;

/// Import failure. Row numbers are 1-based and count the header as row 1.
#[derive(Debug)]
pub enum ImportError {
    /// CSV syntax error, including ragged rows.
    Csv(csv::Error),
    /// Header has fewer than the three identity columns.
    MissingIdentityColumns { found: usize },
    /// A score column header is not a `YYYY-MM-DD` date.
    InvalidDateHeader { column: usize, source: DateParseError },
    /// Two score columns carry the same date.
    DuplicateDateHeader { column: usize, date: NaiveDate },
    /// An identity cell is blank.
    BlankField { row: usize, field: &'static str },
    InvalidDateOfBirth { row: usize, source: DateParseError },
    /// A score cell is not `correct/incorrect`.
    InvalidScore {
        row: usize,
        column: usize,
        value: String,
    },
    /// A student or score failed validation or persistence.
    Repo { row: usize, source: RepoError },
    /// Transaction begin/commit failure.
    Transaction(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "malformed csv: {err}"),
            Self::MissingIdentityColumns { found } => write!(
                f,
                "header must start with first_names,last_name,date_of_birth; found {found} column(s)"
            ),
            Self::InvalidDateHeader { column, source } => {
                write!(f, "column {column}: score header {source}")
            }
            Self::DuplicateDateHeader { column, date } => {
                write!(f, "column {column}: date {date} already has a score column")
            }
            Self::BlankField { row, field } => write!(f, "row {row}: blank {field}"),
            Self::InvalidDateOfBirth { row, source } => {
                write!(f, "row {row}: date_of_birth {source}")
            }
            Self::InvalidScore { row, column, value } => write!(
                f,
                "row {row}, column {column}: `{value}` must be two whole numbers as correct/incorrect"
            ),
            Self::Repo { row, source } => write!(f, "row {row}: {source}"),
            Self::Transaction(err) => write!(f, "import transaction failed: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::InvalidDateHeader { source, .. } => Some(source),
            Self::InvalidDateOfBirth { source, .. } => Some(source),
            Self::Repo { source, .. } => Some(source),
            Self::Transaction(err) => Some(err),
            Self::MissingIdentityColumns { .. }
            | Self::DuplicateDateHeader { .. }
            | Self::BlankField { .. }
            | Self::InvalidScore { .. } => None,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Outcome counters for a successful import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Data rows read, excluding the header.
    pub rows: usize,
    pub students_created: usize,
    pub students_matched: usize,
    /// Scores inserted or replaced.
    pub scores_written: usize,
}

/// Parsed, not yet persisted, sheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SheetRow {
    row: usize,
    first_names: String,
    last_name: String,
    date_of_birth: NaiveDate,
    scores: Vec<(NaiveDate, u32, u32)>,
}

/// Imports CSV text into the database behind `conn`.
///
/// The whole sheet is parsed before the first write, and all writes share
/// one immediate transaction.
pub fn import_csv(conn: &mut Connection, data: &str) -> ImportResult<ImportSummary> {
    let started_at = Instant::now();
    let rows = match parse_sheet(data) {
        Ok(rows) => rows,
        Err(err) => {
            warn!(
                "event=csv_import module=import status=error stage=parse error={}",
                err
            );
            return Err(err);
        }
    };

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| ImportError::Transaction(err.into()))?;
    let summary = apply_rows(&tx, &rows)?;
    tx.commit()
        .map_err(|err| ImportError::Transaction(err.into()))?;

    info!(
        "event=csv_import module=import status=ok rows={} students_created={} students_matched={} scores_written={} duration_ms={}",
        summary.rows,
        summary.students_created,
        summary.students_matched,
        summary.scores_written,
        started_at.elapsed().as_millis()
    );
    Ok(summary)
}

fn apply_rows(conn: &Connection, rows: &[SheetRow]) -> ImportResult<ImportSummary> {
    let students = SqliteStudentRepository::new(conn);
    let scores = SqliteScoreRepository::new(conn);
    let mut seen: HashMap<(String, String), StudentId> = HashMap::new();
    let mut summary = ImportSummary {
        rows: rows.len(),
        ..ImportSummary::default()
    };

    for sheet_row in rows {
        let key = (sheet_row.first_names.clone(), sheet_row.last_name.clone());
        let student_id = match seen.get(&key) {
            Some(id) => *id,
            None => {
                let repo_err = |source| ImportError::Repo {
                    row: sheet_row.row,
                    source,
                };
                let id = match students
                    .find_student_id_by_name(&sheet_row.first_names, &sheet_row.last_name)
                    .map_err(repo_err)?
                {
                    Some(id) => {
                        summary.students_matched += 1;
                        id
                    }
                    None => {
                        let student = Student::new(
                            &sheet_row.first_names,
                            &sheet_row.last_name,
                            sheet_row.date_of_birth,
                        );
                        students.create_student(&student).map_err(repo_err)?;
                        summary.students_created += 1;
                        student.id
                    }
                };
                seen.insert(key, id);
                id
            }
        };

        for (date, correct, incorrect) in &sheet_row.scores {
            let score = SafmedScore::new(student_id, *date, *correct, *incorrect);
            scores
                .upsert_score(&score)
                .map_err(|source| ImportError::Repo {
                    row: sheet_row.row,
                    source,
                })?;
            summary.scores_written += 1;
        }
        debug!(
            "event=csv_import_row module=import row={} scores={}",
            sheet_row.row,
            sheet_row.scores.len()
        );
    }

    Ok(summary)
}

fn parse_sheet(data: &str) -> ImportResult<Vec<SheetRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(data.as_bytes());

    let headers = reader.headers()?.clone();
    let dates = parse_date_headers(&headers)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        rows.push(parse_row(index + 2, &record, &dates)?);
    }
    Ok(rows)
}

fn parse_date_headers(headers: &StringRecord) -> ImportResult<Vec<NaiveDate>> {
    if headers.len() < IDENTITY_COLUMNS {
        return Err(ImportError::MissingIdentityColumns {
            found: headers.len(),
        });
    }

    let mut seen = HashSet::new();
    let mut dates = Vec::with_capacity(headers.len() - IDENTITY_COLUMNS);
    for (index, header) in headers.iter().enumerate().skip(IDENTITY_COLUMNS) {
        let column = index + 1;
        let date = parse_date(header)
            .map_err(|source| ImportError::InvalidDateHeader { column, source })?;
        // One (student, date) key per cell; a repeat would overwrite silently.
        if !seen.insert(date) {
            return Err(ImportError::DuplicateDateHeader { column, date });
        }
        dates.push(date);
    }
    Ok(dates)
}

fn parse_row(row: usize, record: &StringRecord, dates: &[NaiveDate]) -> ImportResult<SheetRow> {
    let first_names = required_field(row, record, 0, "first names")?;
    let last_name = required_field(row, record, 1, "last name")?;
    let dob_text = required_field(row, record, 2, "date of birth")?;
    let date_of_birth =
        parse_date(&dob_text).map_err(|source| ImportError::InvalidDateOfBirth { row, source })?;

    let mut scores = Vec::new();
    for (offset, (cell, date)) in record
        .iter()
        .skip(IDENTITY_COLUMNS)
        .zip(dates.iter())
        .enumerate()
    {
        let column = IDENTITY_COLUMNS + offset + 1;
        if let Some((correct, incorrect)) = parse_score_cell(row, column, cell)? {
            scores.push((*date, correct, incorrect));
        }
    }

    Ok(SheetRow {
        row,
        first_names,
        last_name,
        date_of_birth,
        scores,
    })
}

fn required_field(
    row: usize,
    record: &StringRecord,
    index: usize,
    field: &'static str,
) -> ImportResult<String> {
    match record.get(index).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ImportError::BlankField { row, field }),
    }
}

/// Parses `correct/incorrect`; a blank cell yields `None`.
fn parse_score_cell(row: usize, column: usize, cell: &str) -> ImportResult<Option<(u32, u32)>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }

    let invalid = || ImportError::InvalidScore {
        row,
        column,
        value: cell.to_string(),
    };

    let (correct, incorrect) = cell.split_once('/').ok_or_else(invalid)?;
    let correct = parse_count(correct).ok_or_else(invalid)?;
    let incorrect = parse_count(incorrect).ok_or_else(invalid)?;
    Ok(Some((correct, incorrect)))
}

/// Digits only; `u32::from_str` alone would also take a leading `+`.
fn parse_count(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{parse_score_cell, parse_sheet, ImportError};
    use chrono::NaiveDate;

    #[test]
    fn parse_score_cell_accepts_padded_pairs_and_blanks() {
        assert_eq!(parse_score_cell(2, 4, " 89 / 12 ").unwrap(), Some((89, 12)));
        assert_eq!(parse_score_cell(2, 4, "").unwrap(), None);
    }

    #[test]
    fn parse_score_cell_rejects_malformed_pairs() {
        for cell in ["89/", "/23", "23", "1/2/3", "-1/4", "a/b", "+5/3", "5/+3"] {
            let err = parse_score_cell(3, 5, cell).unwrap_err();
            assert!(
                matches!(err, ImportError::InvalidScore { row: 3, column: 5, .. }),
                "unexpected error for `{cell}`: {err}"
            );
        }
    }

    #[test]
    fn parse_sheet_reads_identity_and_scores() {
        let rows = parse_sheet(
            "first_names,last_name,date_of_birth,2021-02-01,2021-02-02\n\
             Ben,Jones,1990-01-23,89/23,\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].first_names, "Ben");
        assert_eq!(
            rows[0].scores,
            vec![(NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(), 89, 23)]
        );
    }

    #[test]
    fn parse_sheet_rejects_non_date_header() {
        let err = parse_sheet(
            "Ben,Jones,1990-01-23,89/23\n\
             Gemma,Forbes,1988-08-30,98/12\n",
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::InvalidDateHeader { column: 4, .. }));
    }

    #[test]
    fn parse_sheet_rejects_repeated_date_column() {
        let err = parse_sheet(
            "first_names,last_name,date_of_birth,2021-02-01,2021-02-02,2021-02-01\n\
             Ben,Jones,1990-01-23,5/3,,7/2\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImportError::DuplicateDateHeader { column: 6, date }
                if date == NaiveDate::from_ymd_opt(2021, 2, 1).unwrap()
        ));
    }

    #[test]
    fn parse_sheet_rejects_blank_last_name_with_row_number() {
        let err = parse_sheet(
            "first_names,last_name,date_of_birth,2021-02-01\n\
             Ben,Jones,1990-01-23,89/23\n\
             Gemma,,1988-08-30,98/12\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImportError::BlankField {
                row: 3,
                field: "last name"
            }
        ));
    }
}
