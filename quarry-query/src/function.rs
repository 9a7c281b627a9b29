//! SQL function calls used in conditions and field lists.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::value::Value;

/// A function argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Argument {
    /// Bound as a parameter.
    Plain(Value),
    /// Injected verbatim. Caller-trusted; never pass user input here.
    Literal(String),
    /// A column reference, rendered as a quoted identifier.
    Field(String),
}

/// Inline capacity for function arguments; most calls take one to four.
pub type ArgumentList = SmallVec<[Argument; 4]>;

/// A named SQL function call such as `LOWER("email")` or `COALESCE(?, 0)`.
///
/// ```rust
/// use quarry_query::Function;
///
/// let f = Function::new("lower").field("email");
/// assert_eq!(f.name(), "LOWER");
/// assert_eq!(f.arguments().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    name: String,
    arguments: ArgumentList,
    separator: String,
}

impl Function {
    /// Create a call with no arguments. The name is upper-cased.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_uppercase(),
            arguments: SmallVec::new(),
            separator: ", ".to_string(),
        }
    }

    /// Append a bound argument.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.arguments.push(Argument::Plain(value.into()));
        self
    }

    /// Append a verbatim argument.
    pub fn literal(mut self, sql: impl Into<String>) -> Self {
        self.arguments.push(Argument::Literal(sql.into()));
        self
    }

    /// Append a column reference argument.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.arguments.push(Argument::Field(name.into()));
        self
    }

    /// Append an argument.
    pub fn arg(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Change the string placed between arguments (`", "` by default).
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The upper-cased function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The arguments in call order.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// The argument separator.
    pub fn separator_str(&self) -> &str {
        &self.separator
    }

    /// A label for logs and error messages, e.g. `LOWER(email)`.
    pub fn describe(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|a| match a {
                Argument::Plain(_) => "?".to_string(),
                Argument::Literal(s) | Argument::Field(s) => s.clone(),
            })
            .collect();
        format!("{}({})", self.name, args.join(&self.separator))
    }
}

/// Common functions.
pub mod functions {
    use super::Function;

    /// `COUNT(field)`; pass `"*"` for `COUNT(*)`.
    pub fn count(field: &str) -> Function {
        if field == "*" {
            Function::new("count").literal("*")
        } else {
            Function::new("count").field(field)
        }
    }

    /// `LOWER(field)`.
    pub fn lower(field: &str) -> Function {
        Function::new("lower").field(field)
    }

    /// `UPPER(field)`.
    pub fn upper(field: &str) -> Function {
        Function::new("upper").field(field)
    }

    /// `MAX(field)`.
    pub fn max(field: &str) -> Function {
        Function::new("max").field(field)
    }

    /// `MIN(field)`.
    pub fn min(field: &str) -> Function {
        Function::new("min").field(field)
    }

    /// `SUM(field)`.
    pub fn sum(field: &str) -> Function {
        Function::new("sum").field(field)
    }
}
