//! # Quarry
//!
//! Composable SQL queries with data-driven dialects and nested join results.
//!
//! Quarry provides:
//! - Predicate trees mixing AND, OR and XOR groups
//! - Dialects described as data, built in or loaded from TOML
//! - Placeholder SQL with parameters typed by declared column types
//! - Joined rows reassembled into records nested by alias
//! - A SQLite driver behind the default `sqlite` feature
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use quarry::prelude::*;
//! use quarry::sqlite::SqliteDriver;
//!
//! let mut driver = SqliteDriver::open_in_memory()?;
//! driver.execute_batch(
//!     "CREATE TABLE users (id INTEGER, name TEXT);
//!      CREATE TABLE posts (author_id INTEGER, title TEXT);
//!      INSERT INTO users VALUES (1, 'ann');
//!      INSERT INTO posts VALUES (1, 'hello');",
//! )?;
//!
//! let query = Query::select("users")
//!     .alias("User")
//!     .fields(["name"])
//!     .join(Join::left("posts").alias("Post").fields(["title"]).on("id", "author_id"));
//!
//! let dialect = Dialect::sqlite();
//! let types = TypeRegistry::new();
//! let records = fetch(&mut driver, &Renderer::new(&dialect, &types), &query)?;
//!
//! assert_eq!(records[0].related("Post").and_then(|p| p.get("title")), Some(&Value::from("hello")));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Query building, rendering and row reassembly.
pub mod query {
    pub use quarry_query::*;
}

/// The SQLite driver.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use quarry_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use quarry_query::prelude::*;
}

// Re-export key types at the crate root
pub use quarry_query::{Dialect, DialectRegistry, Query, QueryError, QueryResult, Renderer, TypeRegistry};
