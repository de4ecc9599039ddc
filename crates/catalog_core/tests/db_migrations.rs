use catalog_core::db::migrations::latest_version;
use catalog_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tag");
    assert_table_exists(&conn, "tag_alias");
    assert_table_exists(&conn, "tag_category");
}

#[test]
fn migrations_seed_default_category_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(default_category_count(&conn_first), 1);
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(default_category_count(&conn_second), 1);
    let color: String = conn_second
        .query_row(
            "SELECT color FROM tag_category WHERE name = 'default';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(color, "#FFFFFF");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "tag_alias");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite");

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
fn alias_names_are_unique_at_storage_level() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "BEGIN;
         INSERT INTO tag (id, primary_alias_id, category_id) VALUES (1, 1, 1);
         INSERT INTO tag_alias (id, tag_id, name) VALUES (1, 1, 'Action');
         COMMIT;",
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO tag_alias (tag_id, name) VALUES (1, 'Action');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));
}

#[test]
fn primary_alias_reference_is_checked_at_commit() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute_batch(
            "BEGIN;
             INSERT INTO tag (id, primary_alias_id, category_id) VALUES (1, 42, 1);
             COMMIT;",
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn default_category_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM tag_category WHERE name = 'default';",
        [],
        |row| row.get(0),
    )
    .unwrap()
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
