//! Atomic conditions: a subject, an operator and an operand.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::function::Function;
use crate::query::{Query, QueryKind};
use crate::value::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `=`
    Eq,
    /// `<>`
    Neq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `IN (...)`
    In,
    /// `NOT IN (...)`
    NotIn,
    /// `IS NULL`
    Null,
    /// `IS NOT NULL`
    NotNull,
    /// `BETWEEN ? AND ?`
    Between,
    /// `NOT BETWEEN ? AND ?`
    NotBetween,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// Regular expression match.
    Regexp,
    /// Negated regular expression match.
    NotRegexp,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 16] = [
        Self::Eq,
        Self::Neq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::NotIn,
        Self::Null,
        Self::NotNull,
        Self::Between,
        Self::NotBetween,
        Self::Like,
        Self::NotLike,
        Self::Regexp,
        Self::NotRegexp,
    ];

    /// Key of the operator in a dialect's operator table.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Null => "null",
            Self::NotNull => "not_null",
            Self::Between => "between",
            Self::NotBetween => "not_between",
            Self::Like => "like",
            Self::NotLike => "not_like",
            Self::Regexp => "regexp",
            Self::NotRegexp => "not_regexp",
        }
    }

    /// Number of value placeholders the operator's template takes after the
    /// subject. `In`/`NotIn` take one slot that holds the whole list.
    pub fn value_slots(&self) -> usize {
        match self {
            Self::Null | Self::NotNull => 0,
            Self::Between | Self::NotBetween => 2,
            _ => 1,
        }
    }

    /// Whether the operator holds a list of values.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Whether the operator holds a pair of bounds.
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Between | Self::NotBetween)
    }

    /// Whether the operator takes no value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Self::Null | Self::NotNull)
    }

    fn accepts_sub_query(&self) -> bool {
        matches!(self, Self::Eq | Self::Neq | Self::In | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The left-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// A column, optionally qualified (`Alias.column`).
    Field(String),
    /// A function call.
    Function(Function),
}

impl Subject {
    /// The column name used for type lookups, if the subject is a column.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Function(_) => None,
        }
    }

    /// A label for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Field(name) => name.clone(),
            Self::Function(f) => f.describe(),
        }
    }
}

impl From<&str> for Subject {
    fn from(v: &str) -> Self {
        Self::Field(v.to_string())
    }
}

impl From<String> for Subject {
    fn from(v: String) -> Self {
        Self::Field(v)
    }
}

impl From<Function> for Subject {
    fn from(v: Function) -> Self {
        Self::Function(v)
    }
}

/// The right-hand side of a condition, already shaped for its operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// No value (`IS NULL`, `IS NOT NULL`).
    None,
    /// A single value.
    Single(Value),
    /// Lower and upper bound.
    Range(Value, Value),
    /// A list of values.
    List(Vec<Value>),
    /// A nested select.
    SubQuery(Box<Query>),
}

/// A single condition.
///
/// Constructors normalize the operand so the invariants hold for every
/// expression that exists: list operators always carry a list, range
/// operators exactly two bounds, and null checks no value. `Eq`/`Neq` with a
/// list become `In`/`NotIn`, and with null become `Null`/`NotNull`.
///
/// ```rust
/// use quarry_query::{Expression, Operator};
///
/// let e = Expression::eq("id", vec![1, 2]).unwrap();
/// assert_eq!(e.operator(), Operator::In);
///
/// let e = Expression::eq("deleted_at", None::<i64>).unwrap();
/// assert_eq!(e.operator(), Operator::Null);
///
/// assert!(Expression::new("age", Operator::Between, vec![1, 2, 3]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    subject: Subject,
    operator: Operator,
    operand: Operand,
}

impl Expression {
    /// Create an expression, normalizing the value for the operator.
    pub fn new(
        subject: impl Into<Subject>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> QueryResult<Self> {
        let subject = subject.into();
        let value = value.into();

        let operator = match (operator, &value) {
            (Operator::Eq, Value::List(_)) => Operator::In,
            (Operator::Eq, Value::Null) => Operator::Null,
            (Operator::Neq, Value::List(_)) => Operator::NotIn,
            (Operator::Neq, Value::Null) => Operator::NotNull,
            (op, _) => op,
        };

        let operand = match operator {
            Operator::Null | Operator::NotNull => Operand::None,
            Operator::In | Operator::NotIn => match value {
                Value::List(items) => Operand::List(items),
                scalar => Operand::List(vec![scalar]),
            },
            Operator::Between | Operator::NotBetween => match value {
                Value::List(items) => match <[Value; 2]>::try_from(items) {
                    Ok([low, high]) => Operand::Range(low, high),
                    Err(items) => {
                        return Err(QueryError::range_arity(
                            subject.describe(),
                            operator.key(),
                            items.len(),
                        ));
                    }
                },
                _ => return Err(QueryError::range_arity(subject.describe(), operator.key(), 1)),
            },
            _ => match value {
                Value::List(_) => {
                    return Err(QueryError::invalid_argument(
                        subject.describe(),
                        format!("operator '{}' expects a single value, got a list", operator),
                    ));
                }
                scalar => Operand::Single(scalar),
            },
        };

        Ok(Self {
            subject,
            operator,
            operand,
        })
    }

    /// Compare against a nested select.
    ///
    /// Only `Eq`, `Neq`, `In` and `NotIn` accept a sub-query, and the
    /// sub-query must be a plain select.
    pub fn sub_query(subject: impl Into<Subject>, operator: Operator, query: Query) -> QueryResult<Self> {
        let subject = subject.into();
        if !operator.accepts_sub_query() {
            return Err(QueryError::invalid_sub_query(
                subject.describe(),
                format!("operator '{}' cannot compare against a sub-query", operator),
            ));
        }
        if query.kind() != QueryKind::Select {
            return Err(QueryError::invalid_sub_query(
                subject.describe(),
                format!("expected a select, got {}", query.kind()),
            ));
        }
        Ok(Self {
            subject,
            operator,
            operand: Operand::SubQuery(Box::new(query)),
        })
    }

    /// `field = value`, rewritten to `IN` for lists and `IS NULL` for null.
    pub fn eq(subject: impl Into<Subject>, value: impl Into<Value>) -> QueryResult<Self> {
        Self::new(subject, Operator::Eq, value)
    }

    /// `field <> value`, rewritten to `NOT IN` for lists and `IS NOT NULL` for null.
    pub fn not_eq(subject: impl Into<Subject>, value: impl Into<Value>) -> QueryResult<Self> {
        Self::new(subject, Operator::Neq, value)
    }

    /// `field IN (...)`.
    pub fn in_list(subject: impl Into<Subject>, value: impl Into<Value>) -> QueryResult<Self> {
        Self::new(subject, Operator::In, value)
    }

    /// `field NOT IN (...)`.
    pub fn not_in(subject: impl Into<Subject>, value: impl Into<Value>) -> QueryResult<Self> {
        Self::new(subject, Operator::NotIn, value)
    }

    /// `field IS NULL`.
    pub fn is_null(subject: impl Into<Subject>) -> Self {
        Self {
            subject: subject.into(),
            operator: Operator::Null,
            operand: Operand::None,
        }
    }

    /// `field IS NOT NULL`.
    pub fn is_not_null(subject: impl Into<Subject>) -> Self {
        Self {
            subject: subject.into(),
            operator: Operator::NotNull,
            operand: Operand::None,
        }
    }

    /// `field BETWEEN low AND high`.
    pub fn between(
        subject: impl Into<Subject>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self {
            subject: subject.into(),
            operator: Operator::Between,
            operand: Operand::Range(low.into(), high.into()),
        }
    }

    /// The left-hand side.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// The (normalized) operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The (normalized) operand.
    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}
