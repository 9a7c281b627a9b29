//! Raw driver rows and the records assembled from them.
//!
//! Drivers hand back [`RawRow`]s: each column's label, the table the driver
//! believes it came from (if it knows), and the value. Assembly turns them
//! into [`Record`]s, with joined tables nested under their alias.
//!
//! Typed access goes through [`FromValue`]:
//!
//! ```rust
//! use quarry_query::{Record, Value};
//!
//! let mut record = Record::new();
//! record.insert("id", Value::Int(7));
//! record.insert("nickname", Value::Null);
//!
//! let id: i64 = record.try_get("id").unwrap();
//! let nickname: Option<String> = record.try_get("nickname").unwrap();
//! assert_eq!((id, nickname), (7, None));
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::value::{BindingCategory, Value};

/// Separator between alias and column in joined column labels.
pub const ALIAS_SEPARATOR: &str = "__";

/// One column of a raw row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    /// The label the driver reports.
    pub label: String,
    /// The table the driver reports, if any.
    pub table: Option<String>,
    /// The value.
    pub value: Value,
}

impl RawColumn {
    /// Create a column without table provenance.
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            table: None,
            value: value.into(),
        }
    }

    /// Attach the table the driver reported.
    pub fn from_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// A row as returned by a driver, in select-list order.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    /// Columns with metadata.
    Described(Vec<RawColumn>),
    /// Name/value pairs from a driver that reports no column metadata.
    Undescribed(Vec<(String, Value)>),
}

impl RawRow {
    /// Number of columns.
    pub fn len(&self) -> usize {
        match self {
            Self::Described(columns) => columns.len(),
            Self::Undescribed(pairs) => pairs.len(),
        }
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An assembled row: the primary table's fields plus one nested record per
/// joined alias.
///
/// Serializes as a flat JSON object, nested records as sub-objects.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record {
    #[serde(flatten)]
    fields: IndexMap<String, Value>,
    #[serde(flatten)]
    related: IndexMap<String, Record>,
}

impl Record {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. A repeated name keeps its position and takes the later value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Nest a related record under an alias.
    pub fn insert_related(&mut self, alias: impl Into<String>, record: Record) {
        self.related.insert(alias.into(), record);
    }

    /// The nested record for an alias, creating it if needed.
    pub fn related_mut(&mut self, alias: &str) -> &mut Record {
        self.related.entry(alias.to_string()).or_default()
    }

    /// A field's value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A field's value converted to a Rust type.
    pub fn try_get<T: FromValue>(&self, field: &str) -> QueryResult<T> {
        match self.fields.get(field) {
            Some(value) => T::from_value(field, value),
            None => Err(QueryError::invalid_argument(field, "no such field in record")),
        }
    }

    /// A nested record.
    pub fn related(&self, alias: &str) -> Option<&Record> {
        self.related.get(alias)
    }

    /// Fields in column order.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Nested records in first-seen order.
    pub fn relations(&self) -> &IndexMap<String, Record> {
        &self.related
    }

    /// Check if the record has neither fields nor nested records.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.related.is_empty()
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        // Record only holds maps, strings and JSON-safe scalars.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Conversion from a record value into a Rust type.
pub trait FromValue: Sized {
    /// Convert, naming `field` in any error.
    fn from_value(field: &str, value: &Value) -> QueryResult<Self>;
}

fn mismatch(field: &str, category: BindingCategory, value: &Value) -> QueryError {
    QueryError::conversion_failure(field, category, format!("found {}", value.type_name()))
}

impl FromValue for i64 {
    fn from_value(field: &str, value: &Value) -> QueryResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            other => Err(mismatch(field, BindingCategory::Integer, other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(field: &str, value: &Value) -> QueryResult<Self> {
        let wide = i64::from_value(field, value)?;
        i32::try_from(wide).map_err(|_| {
            QueryError::conversion_failure(field, BindingCategory::Integer, format!("{} overflows i32", wide))
        })
    }
}

impl FromValue for f64 {
    fn from_value(field: &str, value: &Value) -> QueryResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch(field, BindingCategory::Text, other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(field: &str, value: &Value) -> QueryResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            other => Err(mismatch(field, BindingCategory::Boolean, other)),
        }
    }
}

impl FromValue for String {
    fn from_value(field: &str, value: &Value) -> QueryResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(field, BindingCategory::Text, other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(field: &str, value: &Value) -> QueryResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(mismatch(field, BindingCategory::Blob, other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(_field: &str, value: &Value) -> QueryResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(field: &str, value: &Value) -> QueryResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(field, other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let mut record = Record::new();
        record.insert("id", Value::Int(1));
        record.related_mut("Post").insert("title", Value::from("hi"));

        assert_eq!(
            record.to_json(),
            serde_json::json!({"id": 1, "Post": {"title": "hi"}})
        );
    }

    #[test]
    fn test_try_get() {
        let mut record = Record::new();
        record.insert("flag", Value::Int(1));
        record.insert("name", Value::from("ann"));

        assert!(record.try_get::<bool>("flag").unwrap());
        assert!(record.try_get::<i64>("name").unwrap_err().is_conversion_failure());
        assert!(record.try_get::<String>("missing").is_err());
    }

    #[test]
    fn test_i32_overflow() {
        let mut record = Record::new();
        record.insert("big", Value::Int(i64::MAX));
        assert!(record.try_get::<i32>("big").is_err());
    }

    #[test]
    fn test_raw_row_len() {
        let row = RawRow::Described(vec![RawColumn::new("id", 1).from_table("users")]);
        assert_eq!(row.len(), 1);
        assert!(RawRow::Undescribed(vec![]).is_empty());
    }
}
