//! Student use-case service.
//!
//! # Responsibility
//! - Provide the add/edit/delete/list entry points behind the student list.
//! - Parse caller-provided date strings before they reach the model.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Missing students surface as `ServiceError::StudentNotFound`.

use crate::dates::{parse_date, DateParseError};
use crate::model::student::{Student, StudentId};
use crate::repo::student_repo::{RepoError, StudentRepository};
use crate::search::filter::filter_students;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned by student and score services.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller-provided date string is not `YYYY-MM-DD`.
    InvalidDate(DateParseError),
    StudentNotFound(StudentId),
    /// No student has the given first names and last name.
    NameNotFound { first_names: String, last_name: String },
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(err) => write!(f, "{err}"),
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::NameNotFound {
                first_names,
                last_name,
            } => write!(f, "no student named `{first_names} {last_name}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDate(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::StudentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<DateParseError> for ServiceError {
    fn from(value: DateParseError) -> Self {
        Self::InvalidDate(value)
    }
}

/// Student service facade over repository implementations.
pub struct StudentService<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> StudentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// All students in list order.
    pub fn all(&self) -> ServiceResult<Vec<Student>> {
        let students = self.repo.list_students()?;
        debug!(
            "event=students_list module=service status=ok count={}",
            students.len()
        );
        Ok(students)
    }

    pub fn get(&self, id: StudentId) -> ServiceResult<Student> {
        self.repo
            .get_student(id)?
            .ok_or(ServiceError::StudentNotFound(id))
    }

    /// Creates a student from raw form input and returns the stored record.
    pub fn add_student(
        &self,
        first_names: &str,
        last_name: &str,
        date_of_birth: &str,
    ) -> ServiceResult<Student> {
        let date_of_birth = parse_date(date_of_birth)?;
        let student = Student::new(first_names, last_name, date_of_birth);
        self.repo.create_student(&student)?;
        info!(
            "event=student_add module=service status=ok student_id={}",
            student.id
        );
        Ok(student)
    }

    /// Replaces names and date of birth for an existing student.
    pub fn edit_student(&self, update: &Student) -> ServiceResult<()> {
        let normalized = Student::with_id(
            update.id,
            &update.first_names,
            &update.last_name,
            update.date_of_birth,
        );
        self.repo.update_student(&normalized)?;
        info!(
            "event=student_edit module=service status=ok student_id={}",
            update.id
        );
        Ok(())
    }

    /// Deletes a student together with all of its scores.
    pub fn delete_student(&self, id: StudentId) -> ServiceResult<()> {
        self.repo.delete_student(id)?;
        info!("event=student_delete module=service status=ok student_id={id}");
        Ok(())
    }

    pub fn id_for_name(&self, first_names: &str, last_name: &str) -> ServiceResult<StudentId> {
        self.repo
            .find_student_id_by_name(first_names, last_name)?
            .ok_or_else(|| ServiceError::NameNotFound {
                first_names: first_names.trim().to_string(),
                last_name: last_name.trim().to_string(),
            })
    }

    /// Students whose display name contains `query`, case-insensitively.
    pub fn filter(&self, query: &str) -> ServiceResult<Vec<Student>> {
        let students = self.all()?;
        Ok(filter_students(&students, query)
            .into_iter()
            .cloned()
            .collect())
    }
}
