//! SQLite driver for Quarry.
//!
//! This crate runs statements rendered by `quarry-query` on a `rusqlite`
//! connection.
//!
//! # Features
//!
//! - Synchronous [`Driver`](quarry_query::Driver) implementation
//! - Parameters bound by their binding category
//! - In-memory and file-based databases configured from a URL
//! - Result rows reassembled into nested records for joins
//!
//! # Example
//!
//! ```rust
//! use quarry_query::{Dialect, Query, Renderer, TypeRegistry, fetch};
//! use quarry_sqlite::SqliteDriver;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut driver = SqliteDriver::open_in_memory()?;
//! driver.execute_batch("CREATE TABLE t (a INTEGER); INSERT INTO t VALUES (1), (2);")?;
//!
//! let dialect = Dialect::sqlite();
//! let types = TypeRegistry::new();
//! let query = Query::select("t").r#where(|p| {
//!     p.also("a", 2)?;
//!     Ok(())
//! })?;
//!
//! let records = fetch(&mut driver, &Renderer::new(&dialect, &types), &query)?;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod types;

pub use config::{DatabasePath, JournalMode, SqliteConfig};
pub use driver::SqliteDriver;
pub use error::{SqliteError, SqliteResult};
pub use types::{param_to_sqlite, value_from_sqlite};
