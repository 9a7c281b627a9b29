//! A synchronous [`Driver`] over a single `rusqlite` connection.

use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use quarry_query::{Driver, DriverOutput, Param, QueryKind, RawColumn, RawRow, quarry_debug};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};
use crate::types::{param_to_sqlite, value_from_sqlite};

/// SQLite driver for rendered Quarry statements.
///
/// Result rows come back [`RawRow::Described`] with the column labels
/// SQLite reports. Table provenance is not available, so joined columns
/// are recognized by their `Alias__column` labels during assembly.
pub struct SqliteDriver {
    conn: Connection,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl SqliteDriver {
    /// Open a connection and apply the configured pragmas.
    pub fn open(config: &SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory()?,
            DatabasePath::File(path) => Connection::open(path)?,
        };

        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(u64::from(ms)))?;
        }
        if !config.path.is_memory() {
            conn.pragma_update_and_check(None, "journal_mode", config.journal_mode.as_pragma(), |_| Ok(()))?;
        }

        info!(path = ?config.path, "SQLite connection opened");
        Ok(Self { conn })
    }

    /// Open a private in-memory database with default settings.
    pub fn open_in_memory() -> SqliteResult<Self> {
        Self::open(&SqliteConfig::memory())
    }

    /// Wrap an existing connection as is.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run one or more semicolon-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Driver for SqliteDriver {
    type Error = SqliteError;

    fn run(&mut self, sql: &str, params: &[Param], kind: QueryKind) -> Result<DriverOutput, SqliteError> {
        let mut stmt = self.conn.prepare(sql)?;

        let expected = stmt.parameter_count();
        if expected != params.len() {
            return Err(SqliteError::ParameterCount {
                expected,
                got: params.len(),
            });
        }
        for (i, param) in params.iter().enumerate() {
            quarry_debug!(index = i + 1, category = %param.category, "binding parameter");
            stmt.raw_bind_parameter(i + 1, param_to_sqlite(param)?)?;
        }

        if !kind.is_read() {
            let changed = stmt.raw_execute()?;
            debug!(kind = %kind, rows = changed, "SQLite write finished");
            return Ok(DriverOutput::RowCount(Some(changed as u64)));
        }

        let labels: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.raw_query();
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(labels.len());
            for (i, label) in labels.iter().enumerate() {
                columns.push(RawColumn::new(label.as_str(), value_from_sqlite(row.get_ref(i)?)));
            }
            out.push(RawRow::Described(columns));
        }

        debug!(kind = %kind, rows = out.len(), "SQLite read finished");
        Ok(DriverOutput::Rows(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_query::{
        Dialect, Join, PreparedStatement, Query, Renderer, SortOrder, TypeRegistry, Value, fetch,
    };

    fn seeded() -> SqliteDriver {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute_batch(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, active INTEGER NOT NULL);
                 CREATE TABLE posts (id INTEGER PRIMARY KEY, author_id INTEGER NOT NULL, title TEXT NOT NULL);
                 INSERT INTO users VALUES (1, 'ann', 1), (2, 'bob', 0), (3, 'cy', 1);
                 INSERT INTO posts VALUES (10, 1, 'hello'), (11, 3, 'again');",
            )
            .unwrap();
        driver
    }

    #[test]
    fn test_select_with_parameters() {
        let mut driver = seeded();
        let dialect = Dialect::sqlite();
        let types = TypeRegistry::new();
        let renderer = Renderer::new(&dialect, &types);

        let query = Query::select("users")
            .fields(["name"])
            .r#where(|p| {
                p.also("active", true)?;
                Ok(())
            })
            .unwrap()
            .order_by("id", SortOrder::Desc);
        let records = fetch(&mut driver, &renderer, &query).unwrap();

        let names: Vec<String> = records.iter().map(|r| r.try_get("name").unwrap()).collect();
        assert_eq!(names, vec!["cy".to_string(), "ann".to_string()]);
    }

    #[test]
    fn test_writes_report_row_counts() {
        let mut driver = seeded();
        let dialect = Dialect::sqlite();
        let types = TypeRegistry::new();
        let renderer = Renderer::new(&dialect, &types);

        let insert = Query::insert("users").set("id", 4).set("name", "dee").set("active", false);
        let mut stmt = PreparedStatement::prepare(&mut driver, &renderer, &insert).unwrap();
        assert_eq!(stmt.save().unwrap(), 1);

        let update = Query::update("users")
            .set("active", true)
            .r#where(|p| {
                p.also("active", false)?;
                Ok(())
            })
            .unwrap();
        let mut stmt = PreparedStatement::prepare(&mut driver, &renderer, &update).unwrap();
        assert_eq!(stmt.save().unwrap(), 2);

        let count = fetch(&mut driver, &renderer, &Query::count("users")).unwrap();
        assert_eq!(count[0].get("count"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_join_rows_are_nested() {
        let mut driver = seeded();
        let dialect = Dialect::sqlite();
        let types = TypeRegistry::new();
        let renderer = Renderer::new(&dialect, &types);

        let query = Query::select("users")
            .alias("User")
            .fields(["id", "name"])
            .join(Join::inner("posts").alias("Post").fields(["title"]).on("id", "author_id"))
            .order_by("User.id", SortOrder::Asc);
        let records = fetch(&mut driver, &renderer, &query).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].to_json(),
            serde_json::json!({"id": 1, "name": "ann", "Post": {"title": "hello"}})
        );
        assert_eq!(records[1].related("Post").and_then(|p| p.get("title")), Some(&Value::from("again")));
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let mut driver = seeded();
        let err = driver
            .run("SELECT * FROM users WHERE id = ?", &[], QueryKind::Select)
            .unwrap_err();
        assert!(matches!(err, SqliteError::ParameterCount { expected: 1, got: 0 }));
    }

    #[test]
    fn test_driver_errors_become_database_errors() {
        let mut driver = seeded();
        let dialect = Dialect::sqlite();
        let types = TypeRegistry::new();
        let renderer = Renderer::new(&dialect, &types);

        let err = fetch(&mut driver, &renderer, &Query::select("missing")).unwrap_err();
        assert!(err.is_database_error());
    }
}
