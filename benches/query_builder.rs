//! Benchmarks for the full query path: build, render, execute, assemble.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quarry::prelude::*;
use quarry::sqlite::SqliteDriver;
use std::hint::black_box;

fn seeded(rows: usize) -> SqliteDriver {
    let driver = SqliteDriver::open_in_memory().expect("open");
    driver
        .execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL);
             CREATE TABLE posts (id INTEGER PRIMARY KEY, author_id INTEGER NOT NULL, title TEXT NOT NULL);",
        )
        .expect("schema");
    let mut sql = String::from("BEGIN;");
    for i in 0..rows {
        sql.push_str(&format!(
            "INSERT INTO users VALUES ({i}, 'user{i}@example.com'); INSERT INTO posts VALUES ({i}, {i}, 'post {i}');"
        ));
    }
    sql.push_str("COMMIT;");
    driver.execute_batch(&sql).expect("seed");
    driver
}

fn joined(limit: u64) -> Query {
    Query::select("users")
        .alias("User")
        .fields(["id", "email"])
        .join(Join::inner("posts").alias("Post").fields(["title"]).on("id", "author_id"))
        .r#where(|p| {
            p.also_op("id", Operator::Gte, 0)?;
            Ok(())
        })
        .expect("query")
        .limit(limit)
}

/// Benchmark reassembly of raw rows into nested records.
fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");
    let query = joined(0);

    for size in [10, 100, 1000] {
        let rows: Vec<RawRow> = (0..size)
            .map(|i| {
                RawRow::Described(vec![
                    RawColumn::new("id", i as i64),
                    RawColumn::new("email", format!("user{}@example.com", i)),
                    RawColumn::new("Post__title", format!("post {}", i)),
                ])
            })
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("joined_rows", size), &rows, |b, rows| {
            b.iter(|| black_box(assemble(rows.clone(), &query)))
        });
    }

    group.finish();
}

/// Benchmark fetching joined records from SQLite.
fn bench_sqlite_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("sqlite_fetch");
    let dialect = Dialect::sqlite();
    let types = TypeRegistry::new();
    let renderer = Renderer::new(&dialect, &types);
    let mut driver = seeded(1000);

    for limit in [1u64, 100, 1000] {
        let query = joined(limit);
        group.throughput(Throughput::Elements(limit));
        group.bench_with_input(BenchmarkId::new("joined", limit), &query, |b, q| {
            b.iter(|| black_box(fetch(&mut driver, &renderer, q).expect("fetch")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_assembly, bench_sqlite_fetch);
criterion_main!(benches);
