//! Tests against file-based SQLite databases.

use pretty_assertions::assert_eq;
use quarry_query::{Dialect, PreparedStatement, Query, Renderer, TypeRegistry, Value, fetch};
use quarry_sqlite::{DatabasePath, JournalMode, SqliteConfig, SqliteDriver};

#[test]
fn test_file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quarry.db");
    let url = format!("sqlite://{}?journal_mode=wal&busy_timeout=100", path.display());

    let config = SqliteConfig::from_url(&url).unwrap();
    assert_eq!(config.path, DatabasePath::File(path.clone()));
    assert_eq!(config.journal_mode, JournalMode::Wal);

    let dialect = Dialect::sqlite();
    let types = TypeRegistry::new();
    let renderer = Renderer::new(&dialect, &types);

    {
        let mut driver = SqliteDriver::open(&config).unwrap();
        let mode: String = driver
            .connection()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        driver.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)").unwrap();
        let insert = Query::insert("notes").set("id", 1).set("body", "kept");
        let mut stmt = PreparedStatement::prepare(&mut driver, &renderer, &insert).unwrap();
        assert_eq!(stmt.save().unwrap(), 1);
    }

    let mut driver = SqliteDriver::open(&SqliteConfig::file(&path)).unwrap();
    let records = fetch(&mut driver, &renderer, &Query::select("notes")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("body"), Some(&Value::from("kept")));
}

#[test]
fn test_open_fails_for_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = SqliteConfig::file(dir.path().join("missing").join("db.sqlite"));
    assert!(SqliteDriver::open(&config).is_err());
}
