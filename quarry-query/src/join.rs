//! Secondary table references.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Selection;

/// The kind of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `INNER JOIN`
    Inner,
    /// `FULL OUTER JOIN`
    Outer,
    /// `STRAIGHT_JOIN`
    Straight,
}

impl JoinKind {
    /// Every join kind.
    pub const ALL: [JoinKind; 5] = [
        Self::Left,
        Self::Right,
        Self::Inner,
        Self::Outer,
        Self::Straight,
    ];

    /// Key of the kind in a dialect's join keyword table.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Inner => "inner",
            Self::Outer => "outer",
            Self::Straight => "straight",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A joined table with its own alias, select list and on-conditions.
///
/// On-conditions map a field of the primary table to a field of the joined
/// one. Unqualified names are qualified by the renderer.
///
/// ```rust
/// use quarry_query::Join;
///
/// let join = Join::left("posts")
///     .alias("Post")
///     .fields(["title"])
///     .on("id", "author_id");
/// assert_eq!(join.alias_name(), "Post");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    kind: JoinKind,
    table: String,
    alias: String,
    fields: Vec<Selection>,
    on: IndexMap<String, String>,
}

impl Join {
    /// Create a join; the alias defaults to the table name.
    pub fn new(kind: JoinKind, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            kind,
            alias: table.clone(),
            table,
            fields: Vec::new(),
            on: IndexMap::new(),
        }
    }

    /// `LEFT JOIN table`.
    pub fn left(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, table)
    }

    /// `RIGHT JOIN table`.
    pub fn right(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Right, table)
    }

    /// `INNER JOIN table`.
    pub fn inner(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, table)
    }

    /// `FULL OUTER JOIN table`.
    pub fn outer(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Outer, table)
    }

    /// Set the alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Append columns to select from the joined table.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add an on-condition `local = foreign`. A repeated local field
    /// replaces the earlier mapping in place.
    pub fn on(mut self, local: impl Into<String>, foreign: impl Into<String>) -> Self {
        self.on.insert(local.into(), foreign.into());
        self
    }

    /// The join kind.
    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// The joined table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The alias.
    pub fn alias_name(&self) -> &str {
        &self.alias
    }

    /// The select list.
    pub fn selections(&self) -> &[Selection] {
        &self.fields
    }

    /// On-conditions in insertion order.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.on.iter().map(|(l, f)| (l.as_str(), f.as_str()))
    }
}
