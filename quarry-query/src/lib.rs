//! # quarry-query
//!
//! Composable SQL queries, dialect-driven rendering and row reassembly.
//!
//! This crate provides:
//! - Predicate trees with AND/OR/XOR groups and typed operators
//! - Queries for select, count, insert, update and delete
//! - Joins whose columns come back nested under their alias
//! - Dialects defined as data, built in or loaded from TOML
//! - A renderer producing placeholder SQL with ordered, typed parameters
//! - A driver seam and an execution wrapper with debug interpolation
//!
//! ## Predicates
//!
//! Conditions are added to a node with `also` (AND), `either` (OR) or
//! `maybe` (XOR). Alternatives with a different connective go in a group:
//!
//! ```rust
//! use quarry_query::{Connective, Dialect, Query, Renderer, TypeRegistry};
//!
//! # fn main() -> quarry_query::QueryResult<()> {
//! let query = Query::select("t").r#where(|p| {
//!     p.also("a", 1)?.group(Connective::Or, |g| {
//!         g.either("b", 2)?.either("b", 3)?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//!
//! let dialect = Dialect::standard();
//! let types = TypeRegistry::new();
//! let statement = Renderer::new(&dialect, &types).render(&query)?;
//!
//! assert_eq!(statement.sql, r#"SELECT * FROM "t" WHERE "a" = ? AND ("b" = ? OR "b" = ?)"#);
//! assert_eq!(statement.params.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Joins and reassembly
//!
//! ```rust
//! use quarry_query::{assemble, Join, Query, RawColumn, RawRow};
//!
//! let query = Query::select("users").join(Join::left("posts").alias("Post").on("id", "author_id"));
//! let rows = vec![RawRow::Described(vec![
//!     RawColumn::new("id", 1),
//!     RawColumn::new("Post__title", "hello"),
//! ])];
//!
//! let records = assemble(rows, &query);
//! assert_eq!(records[0].to_json(), serde_json::json!({"id": 1, "Post": {"title": "hello"}}));
//! ```

pub mod assemble;
pub mod binding;
pub mod dialect;
pub mod error;
pub mod expression;
pub mod function;
pub mod join;
pub mod logging;
pub mod predicate;
pub mod query;
pub mod render;
pub mod row;
pub mod sql;
pub mod statement;
pub mod types;
pub mod value;

pub use assemble::{AliasMap, Assembler, Records, assemble};
pub use binding::TypeRegistry;
pub use dialect::{Dialect, DialectRegistry, LimitOrder, PlaceholderStyle};
pub use error::{ErrorCode, QueryError, QueryResult};
pub use expression::{Expression, Operand, Operator, Subject};
pub use function::{Argument, Function, functions};
pub use join::{Join, JoinKind};
pub use predicate::{Connective, Node, Predicate};
pub use query::{Query, QueryKind};
pub use render::{Renderer, Statement};
pub use row::{ALIAS_SEPARATOR, FromValue, RawColumn, RawRow, Record};
pub use statement::{Driver, DriverOutput, PreparedStatement, fetch, interpolate};
pub use types::{Selection, SortOrder};
pub use value::{BindingCategory, Param, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::assemble::{Assembler, assemble};
    pub use crate::binding::TypeRegistry;
    pub use crate::dialect::{Dialect, DialectRegistry};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::expression::{Expression, Operator};
    pub use crate::function::{Function, functions};
    pub use crate::join::Join;
    pub use crate::predicate::{Connective, Predicate};
    pub use crate::query::{Query, QueryKind};
    pub use crate::render::{Renderer, Statement};
    pub use crate::row::{RawColumn, RawRow, Record};
    pub use crate::statement::{Driver, DriverOutput, PreparedStatement, fetch};
    pub use crate::types::SortOrder;
    pub use crate::value::{BindingCategory, Param, Value};
}
