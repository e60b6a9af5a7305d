use locsnap_core::db::{open_db, open_db_in_memory, DbError, LOCATION_SCHEMA_VERSION};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_location_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), LOCATION_SCHEMA_VERSION);
    assert_eq!(
        column_names(&conn, "location"),
        vec!["id", "latitude", "longitude", "timestamp"]
    );
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locations.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), LOCATION_SCHEMA_VERSION);
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), LOCATION_SCHEMA_VERSION);
    assert_eq!(column_names(&conn_second, "location").len(), 4);
}

#[test]
fn schema_rejects_rows_other_than_the_single_slot() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO location (id, latitude, longitude) VALUES (1, 1.0, 2.0);",
        [],
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO location (id, latitude, longitude) VALUES (2, 3.0, 4.0);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
}

#[test]
fn timestamp_defaults_to_current_time() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO location (id, latitude, longitude) VALUES (1, 1.0, 2.0);",
        [],
    )
    .unwrap();

    let timestamp: Option<String> = conn
        .query_row("SELECT timestamp FROM location WHERE id = 1;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert!(timestamp.is_some());
}

#[test]
fn opening_cache_from_newer_release_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::CacheFromNewerRelease { found: 999 }));
    assert!(err.to_string().contains("newer"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 999);
}

#[test]
fn stamped_file_without_location_table_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE notes (id INTEGER PRIMARY KEY); PRAGMA user_version = {LOCATION_SCHEMA_VERSION};"
    ))
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::MissingLocationTable));
}

#[test]
fn existing_row_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locations.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO location (id, latitude, longitude) VALUES (1, 48.85, 2.35);",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    let row: (f64, f64) = conn
        .query_row("SELECT latitude, longitude FROM location WHERE id = 1;", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(row, (48.85, 2.35));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection, table_name: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table_name});"))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}
