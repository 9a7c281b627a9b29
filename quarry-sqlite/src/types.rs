//! Type conversion utilities for SQLite.

use rusqlite::types::{Value as SqliteValue, ValueRef};

use quarry_query::{BindingCategory, Param, Value};

use crate::error::{SqliteError, SqliteResult};

/// Convert a bound parameter to a SQLite value according to its category.
///
/// Booleans bind as `0`/`1` integers, text-category values bind through
/// their display form.
pub fn param_to_sqlite(param: &Param) -> SqliteResult<SqliteValue> {
    let value = &param.value;
    if value.is_null() {
        return Ok(SqliteValue::Null);
    }
    if value.is_list() {
        return Err(SqliteError::type_conversion(format!(
            "a list cannot be bound as a single {} parameter",
            param.category
        )));
    }

    match (param.category, value) {
        (BindingCategory::Integer | BindingCategory::Boolean, Value::Int(i)) => {
            Ok(SqliteValue::Integer(*i))
        }
        (BindingCategory::Integer | BindingCategory::Boolean, Value::Bool(b)) => {
            Ok(SqliteValue::Integer(i64::from(*b)))
        }
        (BindingCategory::Blob, Value::Bytes(bytes)) => Ok(SqliteValue::Blob(bytes.clone())),
        (BindingCategory::Blob, Value::String(s)) => Ok(SqliteValue::Blob(s.clone().into_bytes())),
        (BindingCategory::Text, Value::String(s)) => Ok(SqliteValue::Text(s.clone())),
        (BindingCategory::Text, Value::Bytes(bytes)) => String::from_utf8(bytes.clone())
            .map(SqliteValue::Text)
            .map_err(|_| SqliteError::type_conversion("blob is not valid UTF-8 text")),
        (BindingCategory::Text, other) => Ok(SqliteValue::Text(other.to_string())),
        (category, other) => Err(SqliteError::type_conversion(format!(
            "cannot bind {} value '{}' as {}",
            other.type_name(),
            other,
            category
        ))),
    }
}

/// Convert a SQLite column value to a [`Value`].
pub fn value_from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}
