//! The abstract statement handed to the renderer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::QueryResult;
use crate::function::Function;
use crate::join::Join;
use crate::predicate::Predicate;
use crate::types::{Selection, SortOrder};
use crate::value::Value;

/// The kind of statement a query renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// `SELECT ...`
    Select,
    /// `SELECT COUNT(*) ...`
    Count,
    /// `INSERT INTO ...`
    Insert,
    /// `UPDATE ...`
    Update,
    /// `DELETE FROM ...`
    Delete,
}

impl QueryKind {
    /// Every kind.
    pub const ALL: [QueryKind; 5] = [
        Self::Select,
        Self::Count,
        Self::Insert,
        Self::Update,
        Self::Delete,
    ];

    /// Key of the kind in a dialect's statement table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Count => "count",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether the statement returns rows.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Select | Self::Count)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statement under construction.
///
/// Built by value with chained calls; the renderer only ever borrows it.
///
/// # Example
///
/// ```rust
/// use quarry_query::{Connective, Join, Query, SortOrder};
///
/// # fn main() -> quarry_query::QueryResult<()> {
/// let query = Query::select("users")
///     .alias("User")
///     .fields(["id", "email"])
///     .join(Join::left("posts").alias("Post").fields(["title"]).on("id", "author_id"))
///     .r#where(|p| {
///         p.also("active", true)?;
///         Ok(())
///     })?
///     .order_by("id", SortOrder::Desc)
///     .limit(10);
///
/// assert_eq!(query.alias_name(), "User");
/// assert_eq!(query.joins().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    kind: QueryKind,
    table: String,
    alias: Option<String>,
    fields: Vec<Selection>,
    joins: Vec<Join>,
    data: IndexMap<String, Value>,
    filter: Predicate,
    having: Predicate,
    group_by: Vec<String>,
    order_by: IndexMap<String, SortOrder>,
    limit: u64,
    offset: u64,
    column_types: IndexMap<String, String>,
}

impl Query {
    /// Create a query of the given kind against a table.
    pub fn new(kind: QueryKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            alias: None,
            fields: Vec::new(),
            joins: Vec::new(),
            data: IndexMap::new(),
            filter: Predicate::new(),
            having: Predicate::new(),
            group_by: Vec::new(),
            order_by: IndexMap::new(),
            limit: 0,
            offset: 0,
            column_types: IndexMap::new(),
        }
    }

    /// Start a select.
    pub fn select(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Select, table)
    }

    /// Start a row count.
    pub fn count(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Count, table)
    }

    /// Start an insert.
    pub fn insert(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Insert, table)
    }

    /// Start an update.
    pub fn update(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Update, table)
    }

    /// Start a delete.
    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Delete, table)
    }

    /// Alias the primary table.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Append columns to the select list.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Append a computed column with an optional output label.
    pub fn select_function(mut self, function: Function, alias: Option<&str>) -> Self {
        self.fields.push(Selection::Function {
            function,
            alias: alias.map(str::to_string),
        });
        self
    }

    /// Add a join.
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Set a column value for an insert or update.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(field.into(), value.into());
        self
    }

    /// Build the WHERE tree.
    ///
    /// May be called repeatedly; later calls keep adding to the same root
    /// node and are subject to the same connective rule.
    pub fn r#where<F>(mut self, build: F) -> QueryResult<Self>
    where
        F: FnOnce(&mut Predicate) -> QueryResult<()>,
    {
        build(&mut self.filter)?;
        Ok(self)
    }

    /// Replace the WHERE tree with a prepared one.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = predicate;
        self
    }

    /// Build the HAVING tree.
    pub fn having<F>(mut self, build: F) -> QueryResult<Self>
    where
        F: FnOnce(&mut Predicate) -> QueryResult<()>,
    {
        build(&mut self.having)?;
        Ok(self)
    }

    /// Group by columns.
    pub fn group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Order by a column. Ordering by the same column twice keeps its first
    /// position and takes the later direction.
    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.insert(field.into(), order);
        self
    }

    /// Limit the number of rows; zero means no limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Skip rows; only rendered together with a limit.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Declare a column's database type, used to pick binding categories.
    pub fn column_type(mut self, field: impl Into<String>, declared: impl Into<String>) -> Self {
        self.column_types.insert(field.into(), declared.into());
        self
    }

    /// The statement kind.
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// The primary table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The explicit alias, if one was set.
    pub fn explicit_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name the primary table is addressed by: its alias, else its name.
    pub fn alias_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// The select list of the primary table.
    pub fn selections(&self) -> &[Selection] {
        &self.fields
    }

    /// The joins in declaration order.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Write data in insertion order.
    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.data
    }

    /// The WHERE tree.
    pub fn where_predicate(&self) -> &Predicate {
        &self.filter
    }

    /// The HAVING tree.
    pub fn having_predicate(&self) -> &Predicate {
        &self.having
    }

    /// GROUP BY columns.
    pub fn grouping(&self) -> &[String] {
        &self.group_by
    }

    /// ORDER BY columns with their direction.
    pub fn ordering(&self) -> &IndexMap<String, SortOrder> {
        &self.order_by
    }

    /// The row limit; zero when unset.
    pub fn limit_value(&self) -> u64 {
        self.limit
    }

    /// The row offset; zero when unset.
    pub fn offset_value(&self) -> u64 {
        self.offset
    }

    /// Declared type of a column: exact name first, then the last dotted
    /// segment (so `User.age` finds a declaration for `age`).
    pub fn declared_type(&self, field: &str) -> Option<&str> {
        if let Some(declared) = self.column_types.get(field) {
            return Some(declared);
        }
        let (_, column) = field.rsplit_once('.')?;
        self.column_types.get(column).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Connective;

    #[test]
    fn test_alias_name() {
        assert_eq!(Query::select("users").alias_name(), "users");
        let q = Query::select("users").alias("User");
        assert_eq!(q.alias_name(), "User");
        assert_eq!(q.explicit_alias(), Some("User"));
    }

    #[test]
    fn test_where_accumulates() {
        let q = Query::select("users")
            .r#where(|p| {
                p.also("a", 1)?;
                Ok(())
            })
            .unwrap()
            .r#where(|p| {
                p.also("b", 2)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(q.where_predicate().len(), 2);
    }

    #[test]
    fn test_where_rejects_mixed_roots() {
        let err = Query::select("users")
            .r#where(|p| {
                p.also("a", 1)?;
                Ok(())
            })
            .unwrap()
            .r#where(|p| {
                p.either("b", 2)?;
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_declared_type_lookup() {
        let q = Query::select("users")
            .column_type("age", "INTEGER")
            .column_type("User.name", "TEXT");
        assert_eq!(q.declared_type("age"), Some("INTEGER"));
        assert_eq!(q.declared_type("User.age"), Some("INTEGER"));
        assert_eq!(q.declared_type("User.name"), Some("TEXT"));
        assert_eq!(q.declared_type("name"), None);
    }

    #[test]
    fn test_order_by_keeps_first_position() {
        let q = Query::select("t")
            .order_by("a", SortOrder::Asc)
            .order_by("b", SortOrder::Asc)
            .order_by("a", SortOrder::Desc);
        let order: Vec<_> = q.ordering().iter().collect();
        assert_eq!(
            order,
            [(&"a".to_string(), &SortOrder::Desc), (&"b".to_string(), &SortOrder::Asc)]
        );
    }

    #[test]
    fn test_query_serializes() {
        let q = Query::count("users")
            .filter({
                let mut p = Predicate::with_connective(Connective::Or);
                p.either("role", "admin").unwrap();
                p
            });
        let json = serde_json::to_string(&q).unwrap();
        let back: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
