use chrono::NaiveDate;
use scorg_core::db::open_db_in_memory;
use scorg_core::{
    RepoError, SafmedScore, ScoreRepository, ScoreValidationError, SqliteScoreRepository,
    SqliteStudentRepository, Student, StudentRepository,
};
use uuid::Uuid;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 2, day).unwrap()
}

fn seeded_student(conn: &rusqlite::Connection, first: &str, last: &str) -> Student {
    let student = Student::new(first, last, NaiveDate::from_ymd_opt(1990, 1, 23).unwrap());
    SqliteStudentRepository::new(conn)
        .create_student(&student)
        .unwrap();
    student
}

#[test]
fn add_and_list_scores_oldest_first() {
    let conn = open_db_in_memory().unwrap();
    let student = seeded_student(&conn, "Ben", "Jones");
    let repo = SqliteScoreRepository::new(&conn);

    repo.add_score(&SafmedScore::new(student.id, date(3), 45, 11))
        .unwrap();
    repo.add_score(&SafmedScore::new(student.id, date(1), 30, 8))
        .unwrap();

    let scores = repo.list_scores(student.id).unwrap();
    assert_eq!(
        scores,
        vec![
            SafmedScore::new(student.id, date(1), 30, 8),
            SafmedScore::new(student.id, date(3), 45, 11),
        ]
    );
}

#[test]
fn scores_are_scoped_per_student() {
    let conn = open_db_in_memory().unwrap();
    let ben = seeded_student(&conn, "Ben", "Jones");
    let gemma = seeded_student(&conn, "Gemma", "Forbes");
    let repo = SqliteScoreRepository::new(&conn);

    repo.add_score(&SafmedScore::new(ben.id, date(1), 30, 8))
        .unwrap();
    repo.add_score(&SafmedScore::new(gemma.id, date(1), 98, 12))
        .unwrap();

    assert_eq!(repo.list_scores(ben.id).unwrap().len(), 1);
    assert_eq!(repo.list_scores(gemma.id).unwrap()[0].correct, 98);
}

#[test]
fn add_same_day_twice_is_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let student = seeded_student(&conn, "Ben", "Jones");
    let repo = SqliteScoreRepository::new(&conn);

    repo.add_score(&SafmedScore::new(student.id, date(1), 30, 8))
        .unwrap();
    let err = repo
        .add_score(&SafmedScore::new(student.id, date(1), 31, 7))
        .unwrap_err();

    match err {
        RepoError::Duplicate(message) => assert!(message.contains("2021-02-01")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn upsert_replaces_counts_for_same_day() {
    let conn = open_db_in_memory().unwrap();
    let student = seeded_student(&conn, "Ben", "Jones");
    let repo = SqliteScoreRepository::new(&conn);

    repo.upsert_score(&SafmedScore::new(student.id, date(1), 30, 8))
        .unwrap();
    repo.upsert_score(&SafmedScore::new(student.id, date(1), 33, 5))
        .unwrap();

    assert_eq!(
        repo.list_scores(student.id).unwrap(),
        vec![SafmedScore::new(student.id, date(1), 33, 5)]
    );
}

#[test]
fn add_for_unknown_student_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteScoreRepository::new(&conn);

    let ghost = Uuid::new_v4();
    let err = repo
        .add_score(&SafmedScore::new(ghost, date(1), 30, 8))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost));
}

#[test]
fn empty_drill_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let student = seeded_student(&conn, "Ben", "Jones");
    let repo = SqliteScoreRepository::new(&conn);

    let err = repo
        .add_score(&SafmedScore::new(student.id, date(1), 0, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidScore(ScoreValidationError::EmptyDrill)
    ));
}

#[test]
fn delete_scores_reports_count_and_keeps_student() {
    let conn = open_db_in_memory().unwrap();
    let student = seeded_student(&conn, "Ben", "Jones");
    let repo = SqliteScoreRepository::new(&conn);

    for day in 1..=3 {
        repo.add_score(&SafmedScore::new(student.id, date(day), 30 + day, 2))
            .unwrap();
    }

    assert_eq!(repo.delete_scores(student.id).unwrap(), 3);
    assert!(repo.list_scores(student.id).unwrap().is_empty());
    assert!(SqliteStudentRepository::new(&conn)
        .get_student(student.id)
        .unwrap()
        .is_some());
}
