//! Integration tests for query execution and result reassembly.
//!
//! These tests verify the flow from a built query through a driver:
//! - Statement execution bookkeeping
//! - Debug interpolation of parameters
//! - Reassembly of joined rows into nested records
//! - Degraded reassembly without column metadata

use std::fmt;

use pretty_assertions::assert_eq;
use quarry::prelude::*;
use quarry::query::{ErrorCode, PlaceholderStyle, interpolate};
use serde_json::json;

#[derive(Debug)]
struct Offline;

impl fmt::Display for Offline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("database offline")
    }
}

impl std::error::Error for Offline {}

/// Replays canned output and remembers what it was asked to run.
#[derive(Debug, Default)]
struct Replay {
    output: Option<DriverOutput>,
    seen: Vec<(String, usize)>,
}

impl Driver for Replay {
    type Error = Offline;

    fn run(&mut self, sql: &str, params: &[Param], _kind: QueryKind) -> Result<DriverOutput, Offline> {
        self.seen.push((sql.to_string(), params.len()));
        self.output.take().ok_or(Offline)
    }
}

fn users_with_posts() -> Query {
    Query::select("users")
        .alias("User")
        .fields(["id", "name"])
        .join(Join::left("posts").alias("Post").fields(["id", "title"]).on("id", "author_id"))
}

/// Test that joined labels assemble into nested records
#[test]
fn test_fetch_nests_joined_columns() {
    let mut driver = Replay {
        output: Some(DriverOutput::Rows(vec![RawRow::Described(vec![
            RawColumn::new("id", 1),
            RawColumn::new("name", "ann"),
            RawColumn::new("Post__id", 10),
            RawColumn::new("Post__title", "hello"),
        ])])),
        ..Default::default()
    };
    let dialect = Dialect::sqlite();
    let types = TypeRegistry::new();

    let records = fetch(&mut driver, &Renderer::new(&dialect, &types), &users_with_posts()).unwrap();
    assert_eq!(
        records[0].to_json(),
        json!({"id": 1, "name": "ann", "Post": {"id": 10, "title": "hello"}})
    );
    assert_eq!(driver.seen.len(), 1);
}

/// Test table provenance reported by the driver
#[test]
fn test_assembly_uses_reported_tables() {
    let rows = vec![RawRow::Described(vec![
        RawColumn::new("id", 1).from_table("users"),
        RawColumn::new("id", 10).from_table("posts"),
        RawColumn::new("total", 3),
    ])];
    let records = assemble(rows, &users_with_posts());
    assert_eq!(records[0].to_json(), json!({"id": 1, "total": 3, "Post": {"id": 10}}));
}

/// Test that rows without metadata come back flat
#[test]
fn test_undescribed_rows_are_flat() {
    let rows = vec![
        RawRow::Undescribed(vec![("id".into(), Value::Int(1)), ("title".into(), Value::from("x"))]),
        RawRow::Undescribed(vec![("id".into(), Value::Int(2))]),
    ];
    let assembler = Assembler::new(&users_with_posts());
    let records: Vec<Record> = assembler.iter(rows).collect();
    assert_eq!(records.len(), 2);
    assert!(records[0].relations().is_empty());
    assert_eq!(records[0].get("title"), Some(&Value::from("x")));
}

/// Test execution bookkeeping on a write
#[test]
fn test_prepared_statement_write() {
    let mut driver = Replay {
        output: Some(DriverOutput::RowCount(Some(3))),
        ..Default::default()
    };
    let dialect = Dialect::postgres();
    let types = TypeRegistry::new();
    let renderer = Renderer::new(&dialect, &types);

    let query = Query::update("users")
        .set("name", "O'Brien")
        .r#where(|p| {
            p.also("id", vec![1, 2, 3])?;
            Ok(())
        })
        .unwrap();
    let mut stmt = PreparedStatement::prepare(&mut driver, &renderer, &query).unwrap();
    assert_eq!(stmt.save().unwrap(), 3);
    assert!(stmt.is_successful());
    assert_eq!(
        stmt.debug_sql(),
        r#"UPDATE "users" SET "name" = 'O''Brien' WHERE "id" IN (1, 2, 3)"#
    );

    // A second execute does not reach the driver again.
    stmt.execute().unwrap();
    assert_eq!(stmt.affected_rows(), 3);
    drop(stmt);
    assert_eq!(driver.seen.len(), 1);
}

/// Test that driver failures surface as database errors with a source
#[test]
fn test_driver_failure_keeps_source() {
    let mut driver = Replay::default();
    let dialect = Dialect::standard();
    let types = TypeRegistry::new();

    let err = fetch(&mut driver, &Renderer::new(&dialect, &types), &Query::select("t")).unwrap_err();
    assert_eq!(err.code, ErrorCode::DatabaseError);
    let source = std::error::Error::source(&err).expect("source");
    assert_eq!(source.to_string(), "database offline");
}

/// Test closing before execution
#[test]
fn test_closed_statement_refuses_to_run() {
    let mut driver = Replay::default();
    let dialect = Dialect::standard();
    let types = TypeRegistry::new();
    let renderer = Renderer::new(&dialect, &types);

    let mut stmt = PreparedStatement::prepare(&mut driver, &renderer, &Query::delete("t")).unwrap();
    stmt.close();
    assert_eq!(stmt.execute().unwrap_err().code, ErrorCode::StatementClosed);
    drop(stmt);
    assert!(driver.seen.is_empty());
}

/// Test interpolation leaves quoted question marks alone
#[test]
fn test_interpolate_skips_literals() {
    let params = [Param::inferred(1), Param::inferred("a")];
    assert_eq!(
        interpolate("SELECT '?' WHERE a = ? AND b = ?", &params, PlaceholderStyle::Question, ('"', '"')),
        "SELECT '?' WHERE a = 1 AND b = 'a'"
    );
    assert_eq!(
        interpolate("a = $2 AND b = $1", &params, PlaceholderStyle::Numbered, ('"', '"')),
        "a = 'a' AND b = 1"
    );
}

/// Test typed access to record fields
#[test]
fn test_record_typed_access() {
    let records = assemble(
        vec![RawRow::Described(vec![
            RawColumn::new("id", 7),
            RawColumn::new("nickname", Value::Null),
        ])],
        &Query::select("users"),
    );
    let id: i64 = records[0].try_get("id").unwrap();
    let nickname: Option<String> = records[0].try_get("nickname").unwrap();
    assert_eq!(id, 7);
    assert_eq!(nickname, None);
    assert!(records[0].try_get::<String>("missing").is_err());
}
