//! In-memory student list filtering.
//!
//! # Invariants
//! - Matching is a case-insensitive substring test on the display name.
//! - A blank query matches every student.
//! - Output preserves input order.

use crate::model::student::Student;

/// Returns whether `student` matches `query`.
pub fn matches(student: &Student, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    student.display_name().to_lowercase().contains(&needle)
}

/// Filters `students` by `query`, keeping input order.
pub fn filter_students<'a>(students: &'a [Student], query: &str) -> Vec<&'a Student> {
    students
        .iter()
        .filter(|student| matches(student, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_students, matches};
    use crate::model::student::Student;
    use chrono::NaiveDate;

    fn roster() -> Vec<Student> {
        let dob = NaiveDate::from_ymd_opt(2012, 5, 1).unwrap();
        vec![
            Student::new("Ben", "Jones", dob),
            Student::new("Gemma Victoria", "Mercer-Forbes", dob),
            Student::new("Benedict", "Okafor", dob),
        ]
    }

    #[test]
    fn blank_query_keeps_everything_in_order() {
        let students = roster();
        let filtered = filter_students(&students, "   ");
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[0].first_names, "Ben");
        assert_eq!(filtered[2].first_names, "Benedict");
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let students = roster();
        let names: Vec<_> = filter_students(&students, " BEN ")
            .into_iter()
            .map(|student| student.last_name.as_str())
            .collect();
        assert_eq!(names, vec!["Jones", "Okafor"]);
    }

    #[test]
    fn query_spans_first_and_last_name() {
        let students = roster();
        assert!(matches(&students[1], "victoria mercer"));
        assert!(!matches(&students[0], "victoria"));
    }
}
