//! Executing rendered statements through a driver.
//!
//! The [`Driver`] trait is the only seam between the query core and a
//! database. A [`PreparedStatement`] wraps one rendered statement and one
//! driver borrow, runs it at most once, and keeps the bookkeeping callers
//! need afterwards: elapsed time, affected rows, and a debug rendering with
//! the parameters inlined.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::assemble::Assembler;
use crate::dialect::{Dialect, PlaceholderStyle};
use crate::error::{QueryError, QueryResult};
use crate::query::{Query, QueryKind};
use crate::render::{Renderer, Statement};
use crate::row::{RawRow, Record};
use crate::value::Param;

/// What a driver returns for one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutput {
    /// A write finished; the count is absent if the driver cannot tell.
    RowCount(Option<u64>),
    /// A read finished with these rows.
    Rows(Vec<RawRow>),
}

/// A database connection able to run positional-parameter SQL.
pub trait Driver {
    /// The driver's own error type, kept as the source of the
    /// [`QueryError`] callers see.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run `sql` with `params` bound in order.
    fn run(&mut self, sql: &str, params: &[Param], kind: QueryKind) -> Result<DriverOutput, Self::Error>;
}

/// One rendered statement bound to a driver.
///
/// `execute` is idempotent: the driver is called on the first call only.
/// A driver failure is reported again by every later call.
#[derive(Debug)]
pub struct PreparedStatement<'d, D: Driver + ?Sized> {
    driver: &'d mut D,
    statement: Statement,
    kind: QueryKind,
    style: PlaceholderStyle,
    quotes: (char, char),
    executed: bool,
    succeeded: bool,
    failure: Option<String>,
    closed: bool,
    elapsed: Duration,
    affected: u64,
    rows: Vec<RawRow>,
}

impl<'d, D: Driver + ?Sized> PreparedStatement<'d, D> {
    /// Wrap an already rendered statement for `dialect`.
    pub fn new(driver: &'d mut D, statement: Statement, kind: QueryKind, dialect: &Dialect) -> Self {
        Self {
            driver,
            statement,
            kind,
            style: dialect.placeholder,
            quotes: dialect.quotes(),
            executed: false,
            succeeded: false,
            failure: None,
            closed: false,
            elapsed: Duration::ZERO,
            affected: 0,
            rows: Vec::new(),
        }
    }

    /// Render a query and wrap the result.
    pub fn prepare(driver: &'d mut D, renderer: &Renderer<'_>, query: &Query) -> QueryResult<Self> {
        let statement = renderer.render(query)?;
        Ok(Self::new(driver, statement, query.kind(), renderer.dialect()))
    }

    /// Run the statement. Later calls repeat the first outcome without rerunning it.
    pub fn execute(&mut self) -> QueryResult<&mut Self> {
        if self.closed {
            return Err(QueryError::statement_closed().with_sql(&self.statement.sql));
        }
        if let Some(failure) = &self.failure {
            return Err(QueryError::database(format!("Statement already failed: {}", failure))
                .with_sql(&self.statement.sql));
        }
        if self.executed {
            return Ok(self);
        }
        self.executed = true;

        let started = Instant::now();
        let outcome = self.driver.run(&self.statement.sql, &self.statement.params, self.kind);
        self.elapsed += started.elapsed();

        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                let err = QueryError::database(format!("Driver failed to run {} statement: {}", self.kind, e))
                    .with_sql(&self.statement.sql)
                    .with_source(e);
                self.failure = Some(err.message.clone());
                return Err(err);
            }
        };

        self.affected = match output {
            DriverOutput::RowCount(count) => count.unwrap_or(1),
            DriverOutput::Rows(rows) => {
                let count = rows.len() as u64;
                self.rows = rows;
                count
            }
        };
        self.succeeded = true;

        debug!(
            sql = %self.debug_sql(),
            elapsed_us = self.elapsed.as_micros() as u64,
            affected = self.affected,
            "Executed statement"
        );
        Ok(self)
    }

    /// Run a write statement and return the affected-row count.
    pub fn save(&mut self) -> QueryResult<u64> {
        if self.kind.is_read() {
            return Err(QueryError::invalid_argument(
                self.kind.as_str(),
                "save runs insert, update and delete statements; use execute for reads",
            ));
        }
        Ok(self.execute()?.affected_rows())
    }

    /// Execute and assemble the rows for the query that produced them.
    ///
    /// The buffered rows are kept, so repeated calls return the same records.
    pub fn records(&mut self, query: &Query) -> QueryResult<Vec<Record>> {
        self.execute()?;
        Ok(Assembler::new(query).iter(self.rows.iter().cloned()).collect())
    }

    /// Release buffered rows. Executing afterwards fails.
    pub fn close(&mut self) {
        self.rows = Vec::new();
        self.closed = true;
    }

    /// Whether the statement ran and the driver reported success.
    pub fn is_successful(&self) -> bool {
        self.succeeded
    }

    /// Whether `execute` has been called.
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Rows written, or rows returned for reads. `1` for writes whose
    /// driver reports no count; `0` before execution.
    pub fn affected_rows(&self) -> u64 {
        self.affected
    }

    /// Total time spent in the driver.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The rendered statement.
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Rows buffered by a read.
    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    /// The SQL with parameters inlined as literals.
    pub fn debug_sql(&self) -> String {
        interpolate(&self.statement.sql, &self.statement.params, self.style, self.quotes)
    }
}

/// Inline parameters into their placeholders, for logs and error messages.
///
/// The first placeholder takes the first parameter. Placeholders inside
/// single-quoted literals and inside identifiers quoted with `quotes` are
/// left alone, as are placeholders with no matching parameter. The output
/// is never meant to be executed.
///
/// ```rust
/// use quarry_query::{Param, PlaceholderStyle, Value};
/// use quarry_query::statement::interpolate;
///
/// let params = [Param::inferred(5), Param::inferred("O'Brien"), Param::inferred(Value::Null)];
/// assert_eq!(
///     interpolate("a = ? AND b = ? AND c = ?", &params, PlaceholderStyle::Question, ('"', '"')),
///     "a = 5 AND b = 'O''Brien' AND c = NULL"
/// );
/// ```
pub fn interpolate(sql: &str, params: &[Param], style: PlaceholderStyle, quotes: (char, char)) -> String {
    let (open, close) = quotes;
    let mut out = String::with_capacity(sql.len() + params.len() * 4);
    let mut in_literal = false;
    let mut in_identifier = false;
    let mut next = 0usize;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if in_identifier {
            out.push(c);
            if c == close {
                match chars.peek() {
                    // doubled close quote is an escaped character
                    Some(&(_, d)) if d == close => {
                        out.push(d);
                        chars.next();
                    }
                    _ => in_identifier = false,
                }
            }
            continue;
        }
        if in_literal {
            if c == '\'' {
                in_literal = false;
            }
            out.push(c);
            continue;
        }
        if c == '\'' {
            in_literal = true;
            out.push(c);
            continue;
        }
        if c == open {
            in_identifier = true;
            out.push(c);
            continue;
        }
        match (style, c) {
            (PlaceholderStyle::Question, '?') => {
                match params.get(next) {
                    Some(param) => out.push_str(&param.to_debug_literal()),
                    None => out.push('?'),
                }
                next += 1;
            }
            (PlaceholderStyle::Numbered, '$') => {
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = j + d.len_utf8();
                    chars.next();
                }
                let index = sql[start..end].parse::<usize>().ok().filter(|n| *n > 0);
                match index.and_then(|n| params.get(n - 1)) {
                    Some(param) => out.push_str(&param.to_debug_literal()),
                    None => out.push_str(&sql[i..end]),
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Render, execute and assemble a read in one call.
pub fn fetch<D: Driver + ?Sized>(driver: &mut D, renderer: &Renderer<'_>, query: &Query) -> QueryResult<Vec<Record>> {
    PreparedStatement::prepare(driver, renderer, query)?.records(query)
}
