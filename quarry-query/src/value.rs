//! Values bound into statements and read back out of rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value that can be compared against, bound as a parameter, or returned
/// in a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// List of values.
    List(Vec<Value>),
    /// Binary value.
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is a list value.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Borrow the value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the value's variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "{}", s),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// The coarse data kind a parameter must be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingCategory {
    /// Bound as text.
    Text,
    /// Bound as an integer.
    Integer,
    /// Bound as a boolean.
    Boolean,
    /// Bound as a binary blob.
    Blob,
}

impl BindingCategory {
    /// Infer the category from a value when no column type is declared.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Boolean,
            Value::Int(_) => Self::Integer,
            Value::Bytes(_) => Self::Blob,
            _ => Self::Text,
        }
    }

    /// Lower-case name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Blob => "blob",
        }
    }
}

impl fmt::Display for BindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bound parameter: the value plus the category the driver binds it as.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    /// The value to bind.
    pub value: Value,
    /// How the driver should bind it.
    pub category: BindingCategory,
}

impl Param {
    /// Create a parameter with an explicit category.
    pub fn new(value: Value, category: BindingCategory) -> Self {
        Self { value, category }
    }

    /// Create a parameter whose category is inferred from the value.
    pub fn inferred(value: impl Into<Value>) -> Self {
        let value = value.into();
        let category = BindingCategory::infer(&value);
        Self { value, category }
    }

    /// Render the parameter as a SQL literal, for debug output only.
    ///
    /// Null renders as `NULL`, integer and boolean categories as unquoted
    /// numerals, everything else single-quoted with quotes doubled.
    pub fn to_debug_literal(&self) -> String {
        match (&self.value, self.category) {
            (Value::Null, _) => "NULL".to_string(),
            (Value::Bool(b), BindingCategory::Integer | BindingCategory::Boolean) => {
                (*b as i64).to_string()
            }
            (Value::Int(i), BindingCategory::Integer | BindingCategory::Boolean) => i.to_string(),
            (Value::Float(f), BindingCategory::Integer) => (*f as i64).to_string(),
            (Value::Bytes(b), _) => format!("'{}'", String::from_utf8_lossy(b).replace('\'', "''")),
            (other, _) => format!("'{}'", other.to_string().replace('\'', "''")),
        }
    }
}
