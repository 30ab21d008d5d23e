//! Unit tests for the Lockbox database layer (connection + migrations).

use lockbox::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use lockbox::database::Database;
use tempfile::TempDir;

fn table_exists(db: &Database, table: &str) -> bool {
    db.connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )
        .unwrap_or(false)
}

#[test]
fn test_migrations_create_tables() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    for table in ["logins", "store_meta", "schema_version"] {
        assert!(table_exists(&db, table), "Table '{}' should exist after migrations", table);
    }
}

#[test]
fn test_hostname_index_exists() {
    let db = Database::open_in_memory().unwrap();
    let exists: bool = db
        .connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='index' AND name='idx_logins_hostname'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(exists);
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(get_schema_version(&db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_usage_columns_present() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.connection();
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('logins')").unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(columns.contains(&"times_used".to_string()));
    assert!(columns.contains(&"time_last_used".to_string()));
}

#[test]
fn test_reopening_file_database_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lockbox.db");

    {
        let db = Database::open(&path).unwrap();
        db.connection()
            .execute("INSERT INTO store_meta (key, value) VALUES ('probe', x'01')", [])
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(get_schema_version(&db.connection()), CURRENT_SCHEMA_VERSION);
    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM store_meta WHERE key = 'probe'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1, "existing rows survive a reopen");
}
