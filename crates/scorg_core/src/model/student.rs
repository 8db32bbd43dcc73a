//! Student domain model.
//!
//! # Responsibility
//! - Define the canonical student record shown in the student list.
//! - Validate names and date of birth before persistence.
//!
//! # Invariants
//! - `id` is stable for the lifetime of the student and never reused.
//! - Names are stored trimmed; blank names are invalid.
//! - `(first_names, last_name)` identifies a student for CSV import matching.

use crate::dates::today;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a student.
pub type StudentId = Uuid;

/// Validation failures for [`Student`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    BlankFirstNames,
    BlankLastName,
    DateOfBirthInFuture(NaiveDate),
}

impl Display for StudentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFirstNames => write!(f, "first names must not be blank"),
            Self::BlankLastName => write!(f, "last name must not be blank"),
            Self::DateOfBirthInFuture(date) => {
                write!(f, "date of birth {date} is in the future")
            }
        }
    }
}

impl Error for StudentValidationError {}

/// A tracked student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub first_names: String,
    pub last_name: String,
    /// Serialized as `YYYY-MM-DD`.
    pub date_of_birth: NaiveDate,
}

impl Student {
    /// Creates a student with a freshly generated id.
    pub fn new(
        first_names: impl AsRef<str>,
        last_name: impl AsRef<str>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), first_names, last_name, date_of_birth)
    }

    /// Creates a student with a caller-provided id.
    ///
    /// Used by edit paths where identity already exists.
    pub fn with_id(
        id: StudentId,
        first_names: impl AsRef<str>,
        last_name: impl AsRef<str>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            id,
            first_names: first_names.as_ref().trim().to_string(),
            last_name: last_name.as_ref().trim().to_string(),
            date_of_birth,
        }
    }

    /// Checks name and date-of-birth invariants against the current date.
    pub fn validate(&self) -> Result<(), StudentValidationError> {
        self.validate_on(today())
    }

    /// Same as [`Student::validate`] with an explicit reference date.
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), StudentValidationError> {
        if self.first_names.trim().is_empty() {
            return Err(StudentValidationError::BlankFirstNames);
        }
        if self.last_name.trim().is_empty() {
            return Err(StudentValidationError::BlankLastName);
        }
        if self.date_of_birth > today {
            return Err(StudentValidationError::DateOfBirthInFuture(
                self.date_of_birth,
            ));
        }
        Ok(())
    }

    /// `"first_names last_name"`, as rendered in the student list.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::{Student, StudentValidationError};
    use chrono::NaiveDate;

    fn dob() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 1, 23).unwrap()
    }

    #[test]
    fn new_trims_names_and_generates_id() {
        let student = Student::new("  Gemma Victoria ", " Mercer-Forbes", dob());
        assert!(!student.id.is_nil());
        assert_eq!(student.first_names, "Gemma Victoria");
        assert_eq!(student.last_name, "Mercer-Forbes");
        assert_eq!(student.display_name(), "Gemma Victoria Mercer-Forbes");
    }

    #[test]
    fn validate_rejects_blank_names() {
        let reference = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            Student::new(" ", "Jones", dob()).validate_on(reference),
            Err(StudentValidationError::BlankFirstNames)
        );
        assert_eq!(
            Student::new("Ben", "", dob()).validate_on(reference),
            Err(StudentValidationError::BlankLastName)
        );
    }

    #[test]
    fn validate_rejects_future_date_of_birth() {
        let reference = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let future = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = Student::new("Ben", "Jones", future)
            .validate_on(reference)
            .unwrap_err();
        assert_eq!(err, StudentValidationError::DateOfBirthInFuture(future));
    }
}
