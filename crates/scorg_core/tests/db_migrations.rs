use rusqlite::Connection;
use scorg_core::db::migrations::latest_version;
use scorg_core::db::{open_db, open_db_in_memory, DbError};

fn schema_version(conn: &Connection) -> u32 {
    scorg_core::db::schema_version(conn).unwrap()
}

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "students");
    assert_table_exists(&conn, "safmed_scores");
}

#[test]
fn foreign_keys_are_enforced_on_open() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scorg.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "students");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_blank_names_and_negative_counts() {
    let conn = open_db_in_memory().unwrap();

    let blank = conn.execute(
        "INSERT INTO students (uuid, first_names, last_name, date_of_birth)
         VALUES ('a', '   ', 'Jones', '1990-01-23');",
        [],
    );
    assert!(blank.is_err());

    conn.execute(
        "INSERT INTO students (uuid, first_names, last_name, date_of_birth)
         VALUES ('b', 'Ben', 'Jones', '1990-01-23');",
        [],
    )
    .unwrap();
    let negative = conn.execute(
        "INSERT INTO safmed_scores (student_uuid, date, correct, incorrect)
         VALUES ('b', '2021-02-01', -1, 3);",
        [],
    );
    assert!(negative.is_err());
}

#[test]
fn failed_schema_step_reports_step_and_keeps_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("half.sqlite3");

    // Stamped as version 1 but missing the students table the name index needs.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(
            err,
            DbError::Migration {
                version: 2,
                name: "student_name_index",
                ..
            }
        ),
        "unexpected error: {err}"
    );
    assert!(err.to_string().starts_with("schema step 2 (student_name_index) failed"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 1);
}

#[test]
fn deleting_student_row_cascades_to_scores() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO students (uuid, first_names, last_name, date_of_birth)
         VALUES ('s1', 'Ben', 'Jones', '1990-01-23'), ('s2', 'Gemma', 'Forbes', '1988-08-30');
         INSERT INTO safmed_scores (student_uuid, date, correct, incorrect)
         VALUES ('s1', '2021-02-01', 89, 23), ('s1', '2021-02-02', 91, 20),
                ('s2', '2021-02-01', 98, 12);
         DELETE FROM students WHERE uuid = 's1';",
    )
    .unwrap();

    let remaining: Vec<String> = conn
        .prepare("SELECT student_uuid FROM safmed_scores;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(remaining, ["s2"]);
}

#[test]
fn score_for_unknown_student_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let orphan = conn.execute(
        "INSERT INTO safmed_scores (student_uuid, date, correct, incorrect)
         VALUES ('nobody', '2021-02-01', 5, 3);",
        [],
    );
    assert!(orphan.is_err());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
