//! SAFMED score repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Score writes must call `SafmedScore::validate()` first.
//! - A score can only reference an existing student.
//! - `add_score` refuses to overwrite; `upsert_score` replaces counts for the
//!   same `(student, date)`.

use crate::dates::{format_date, parse_date};
use crate::model::score::SafmedScore;
use crate::model::student::StudentId;
use crate::repo::student_repo::{
    is_foreign_key_violation, is_unique_violation, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

/// Repository interface for SAFMED score persistence.
pub trait ScoreRepository {
    fn add_score(&self, score: &SafmedScore) -> RepoResult<()>;
    fn upsert_score(&self, score: &SafmedScore) -> RepoResult<()>;
    /// Ordered by date ascending.
    fn list_scores(&self, student_id: StudentId) -> RepoResult<Vec<SafmedScore>>;
    /// Returns number of deleted rows.
    fn delete_scores(&self, student_id: StudentId) -> RepoResult<usize>;
}

/// SQLite-backed score repository.
pub struct SqliteScoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScoreRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ScoreRepository for SqliteScoreRepository<'_> {
    fn add_score(&self, score: &SafmedScore) -> RepoResult<()> {
        score.validate()?;

        self.conn
            .execute(
                "INSERT INTO safmed_scores (student_uuid, date, correct, incorrect)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    score.student_id.to_string(),
                    format_date(score.date),
                    score.correct,
                    score.incorrect,
                ],
            )
            .map_err(|err| map_score_write_error(err, score))?;

        Ok(())
    }

    fn upsert_score(&self, score: &SafmedScore) -> RepoResult<()> {
        score.validate()?;

        self.conn
            .execute(
                "INSERT INTO safmed_scores (student_uuid, date, correct, incorrect)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (student_uuid, date) DO UPDATE SET
                    correct = excluded.correct,
                    incorrect = excluded.incorrect;",
                params![
                    score.student_id.to_string(),
                    format_date(score.date),
                    score.correct,
                    score.incorrect,
                ],
            )
            .map_err(|err| map_score_write_error(err, score))?;

        Ok(())
    }

    fn list_scores(&self, student_id: StudentId) -> RepoResult<Vec<SafmedScore>> {
        let mut stmt = self.conn.prepare(
            "SELECT student_uuid, date, correct, incorrect
             FROM safmed_scores
             WHERE student_uuid = ?1
             ORDER BY date ASC;",
        )?;

        let mut rows = stmt.query([student_id.to_string()])?;
        let mut scores = Vec::new();
        while let Some(row) = rows.next()? {
            scores.push(parse_score_row(row)?);
        }

        Ok(scores)
    }

    fn delete_scores(&self, student_id: StudentId) -> RepoResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM safmed_scores WHERE student_uuid = ?1;",
            [student_id.to_string()],
        )?;
        Ok(deleted)
    }
}

fn parse_score_row(row: &Row<'_>) -> RepoResult<SafmedScore> {
    let uuid_text: String = row.get("student_uuid")?;
    let student_id = parse_uuid(&uuid_text)?;

    let date_text: String = row.get("date")?;
    let date = parse_date(&date_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{date_text}` in safmed_scores.date"))
    })?;

    let correct: i64 = row.get("correct")?;
    let incorrect: i64 = row.get("incorrect")?;

    Ok(SafmedScore {
        student_id,
        date,
        correct: count_from_db(correct, "correct")?,
        incorrect: count_from_db(incorrect, "incorrect")?,
    })
}

fn count_from_db(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid count `{value}` in safmed_scores.{column}"))
    })
}

fn map_score_write_error(err: rusqlite::Error, score: &SafmedScore) -> RepoError {
    if is_foreign_key_violation(&err) {
        return RepoError::NotFound(score.student_id);
    }
    if is_unique_violation(&err) {
        return RepoError::Duplicate(format!(
            "a SAFMED score for {} already exists",
            format_date(score.date)
        ));
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::count_from_db;
    use crate::repo::student_repo::RepoError;

    #[test]
    fn count_from_db_rejects_negative_values() {
        assert_eq!(count_from_db(12, "correct").unwrap(), 12);
        assert!(matches!(
            count_from_db(-1, "incorrect"),
            Err(RepoError::InvalidData(message)) if message.contains("incorrect")
        ));
    }
}
