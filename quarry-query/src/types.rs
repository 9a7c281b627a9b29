//! Common types used in query building.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::function::Function;

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// A column of the table the selection belongs to.
    Field(String),
    /// A computed column, optionally labelled.
    Function {
        /// The call.
        function: Function,
        /// Output label.
        alias: Option<String>,
    },
}

impl Selection {
    /// The column name for a plain field selection.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Function { .. } => None,
        }
    }
}

impl From<&str> for Selection {
    fn from(v: &str) -> Self {
        Self::Field(v.to_string())
    }
}

impl From<String> for Selection {
    fn from(v: String) -> Self {
        Self::Field(v)
    }
}

impl From<Function> for Selection {
    fn from(function: Function) -> Self {
        Self::Function {
            function,
            alias: None,
        }
    }
}
