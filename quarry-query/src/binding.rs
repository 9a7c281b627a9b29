//! Declared column types and the binding categories they map to.
//!
//! A [`TypeRegistry`] is scoped to one dialect or driver and handed to the
//! renderer explicitly. It answers two questions: which category does a
//! declared type bind as, and can a value be coerced into that category.

use indexmap::IndexMap;

use crate::error::{QueryError, QueryResult};
use crate::value::{BindingCategory, Param, Value};

const INTEGER_TYPES: &[&str] = &[
    "int", "integer", "tinyint", "smallint", "mediumint", "bigint", "int2", "int4", "int8",
    "serial", "bigserial", "smallserial",
];
const BOOLEAN_TYPES: &[&str] = &["bool", "boolean", "bit"];
const BLOB_TYPES: &[&str] = &[
    "blob", "tinyblob", "mediumblob", "longblob", "binary", "varbinary", "bytea",
];
const TEXT_TYPES: &[&str] = &[
    "text", "tinytext", "mediumtext", "longtext", "char", "varchar", "nchar", "nvarchar",
    "string", "uuid", "json", "jsonb", "date", "datetime", "timestamp", "timestamptz", "time",
    "decimal", "numeric", "float", "double", "real",
];

/// Maps declared column type names to binding categories.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: IndexMap<String, BindingCategory>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (names, category) in [
            (INTEGER_TYPES, BindingCategory::Integer),
            (BOOLEAN_TYPES, BindingCategory::Boolean),
            (BLOB_TYPES, BindingCategory::Blob),
            (TEXT_TYPES, BindingCategory::Text),
        ] {
            for name in names {
                registry.types.insert((*name).to_string(), category);
            }
        }
        registry
    }
}

impl TypeRegistry {
    /// A registry with the built-in mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with no mappings at all.
    pub fn empty() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Map a declared type name to a category, replacing any earlier mapping.
    pub fn register(&mut self, declared: &str, category: BindingCategory) -> &mut Self {
        self.types.insert(normalize(declared), category);
        self
    }

    /// The category for a declared type, if it is known.
    ///
    /// Matching ignores case and any size suffix: `VARCHAR(255)` is `varchar`.
    pub fn category(&self, declared: &str) -> Option<BindingCategory> {
        self.types.get(&normalize(declared)).copied()
    }

    /// Build the parameter for a value bound against a column.
    ///
    /// With a known declared type the value is coerced to that type's
    /// category; otherwise the category is inferred and the value is left
    /// untouched.
    pub fn bind(&self, field: &str, declared: Option<&str>, value: Value) -> QueryResult<Param> {
        match declared.and_then(|d| self.category(d)) {
            Some(category) => Ok(Param::new(coerce(field, value, category)?, category)),
            None => Ok(Param::inferred(value)),
        }
    }
}

fn normalize(declared: &str) -> String {
    let base = declared.split('(').next().unwrap_or(declared);
    base.trim().to_lowercase()
}

/// Coerce a value into the shape a category binds as.
pub fn coerce(field: &str, value: Value, category: BindingCategory) -> QueryResult<Value> {
    if value.is_null() {
        return Ok(value);
    }
    let fail = |value: &Value| {
        QueryError::conversion_failure(
            field,
            category,
            format!("cannot bind {} value '{}'", value.type_name(), value),
        )
    };

    match category {
        BindingCategory::Integer => match value {
            Value::Int(_) => Ok(value),
            Value::Bool(b) => Ok(Value::Int(b as i64)),
            // i64::MAX as f64 rounds up to 2^63, which is already out of range
            Value::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Ok(Value::Int(f as i64))
            }
            Value::String(ref s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| fail(&value)),
            other => Err(fail(&other)),
        },
        BindingCategory::Boolean => match value {
            Value::Bool(_) => Ok(value),
            Value::Int(i) => Ok(Value::Bool(i != 0)),
            Value::String(ref s) => match s.trim().to_lowercase().as_str() {
                "true" | "t" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "f" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(fail(&value)),
            },
            other => Err(fail(&other)),
        },
        BindingCategory::Blob => match value {
            Value::Bytes(_) => Ok(value),
            Value::String(s) => Ok(Value::Bytes(s.into_bytes())),
            other => Err(fail(&other)),
        },
        BindingCategory::Text => match value {
            Value::String(_) => Ok(value),
            Value::Int(i) => Ok(Value::String(i.to_string())),
            Value::Float(f) => Ok(Value::String(f.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Bytes(bytes) => String::from_utf8(bytes)
                .map(Value::String)
                .map_err(|e| fail(&Value::Bytes(e.into_bytes()))),
            other => Err(fail(&other)),
        },
    }
}
