//! Assessment score model.
//!
//! # Invariants
//! - A score belongs to exactly one student and one calendar date.
//! - At most one score exists per `(student, date)` for a given assessment.
//! - `correct + incorrect > 0`.

use crate::model::student::StudentId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Assessment type a score was recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    /// Say-All-Fast-Minute-Every-Day-Shuffled fluency drill.
    Safmed,
}

impl AssessmentKind {
    /// Human-facing label used in chart captions.
    pub fn label(self) -> &'static str {
        match self {
            Self::Safmed => "SAFMED",
        }
    }
}

/// Validation failures for [`SafmedScore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreValidationError {
    /// Both counts are zero.
    EmptyDrill,
}

impl Display for ScoreValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDrill => write!(f, "a score needs at least one correct or incorrect answer"),
        }
    }
}

impl Error for ScoreValidationError {}

/// One dated SAFMED drill result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafmedScore {
    /// Serialized as `id` to match the front-end wire shape.
    #[serde(rename = "id")]
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub correct: u32,
    pub incorrect: u32,
}

impl SafmedScore {
    pub fn new(student_id: StudentId, date: NaiveDate, correct: u32, incorrect: u32) -> Self {
        Self {
            student_id,
            date,
            correct,
            incorrect,
        }
    }

    pub fn validate(&self) -> Result<(), ScoreValidationError> {
        if self.total() == 0 {
            return Err(ScoreValidationError::EmptyDrill);
        }
        Ok(())
    }

    pub fn total(&self) -> u64 {
        u64::from(self.correct) + u64::from(self.incorrect)
    }

    /// Fraction of answers that were correct, `None` for an empty drill.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(f64::from(self.correct) / total as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SafmedScore, ScoreValidationError};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
    }

    #[test]
    fn accuracy_and_total() {
        let score = SafmedScore::new(Uuid::new_v4(), date(), 75, 25);
        assert_eq!(score.total(), 100);
        assert_eq!(score.accuracy(), Some(0.75));
    }

    #[test]
    fn validate_rejects_empty_drill() {
        let score = SafmedScore::new(Uuid::new_v4(), date(), 0, 0);
        assert_eq!(score.validate(), Err(ScoreValidationError::EmptyDrill));
        assert_eq!(score.accuracy(), None);
        assert!(SafmedScore::new(Uuid::new_v4(), date(), 0, 3).validate().is_ok());
    }

    #[test]
    fn serializes_student_id_as_id() {
        let student_id = Uuid::new_v4();
        let json = serde_json::to_value(SafmedScore::new(student_id, date(), 89, 23)).unwrap();
        assert_eq!(json["id"], student_id.to_string());
        assert_eq!(json["date"], "2021-01-01");
        assert!(json.get("student_id").is_none());

        let back: SafmedScore = serde_json::from_value(json).unwrap();
        assert_eq!(back.student_id, student_id);
    }
}
