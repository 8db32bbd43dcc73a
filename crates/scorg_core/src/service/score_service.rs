//! SAFMED score use-case service.
//!
//! # Invariants
//! - Scores are only recorded against existing students.
//! - Listing scores for an unknown student is an error, not an empty list.

use crate::dates::parse_date;
use crate::model::score::SafmedScore;
use crate::model::student::StudentId;
use crate::repo::score_repo::ScoreRepository;
use crate::repo::student_repo::StudentRepository;
use crate::service::student_service::{ServiceError, ServiceResult};
use log::info;

/// Score service facade. Needs student lookups to tell "no scores yet" apart
/// from "no such student".
pub struct ScoreService<S: StudentRepository, R: ScoreRepository> {
    students: S,
    scores: R,
}

impl<S: StudentRepository, R: ScoreRepository> ScoreService<S, R> {
    pub fn new(students: S, scores: R) -> Self {
        Self { students, scores }
    }

    /// Records one drill result from raw form input.
    pub fn add_safmed_score(
        &self,
        student_id: StudentId,
        date: &str,
        correct: u32,
        incorrect: u32,
    ) -> ServiceResult<SafmedScore> {
        let date = parse_date(date)?;
        let score = SafmedScore::new(student_id, date, correct, incorrect);
        self.scores.add_score(&score)?;
        info!("event=score_add module=service status=ok student_id={student_id} date={date}");
        Ok(score)
    }

    /// Scores for one student, oldest first.
    pub fn safmed_scores(&self, student_id: StudentId) -> ServiceResult<Vec<SafmedScore>> {
        self.ensure_student(student_id)?;
        Ok(self.scores.list_scores(student_id)?)
    }

    /// Removes every score for a student and returns how many were removed.
    pub fn delete_safmed_scores(&self, student_id: StudentId) -> ServiceResult<usize> {
        self.ensure_student(student_id)?;
        let deleted = self.scores.delete_scores(student_id)?;
        info!(
            "event=scores_delete module=service status=ok student_id={student_id} count={deleted}"
        );
        Ok(deleted)
    }

    fn ensure_student(&self, student_id: StudentId) -> ServiceResult<()> {
        match self.students.get_student(student_id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::StudentNotFound(student_id)),
        }
    }
}
