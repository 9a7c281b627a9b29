//! Error types for query building, rendering and execution.
//!
//! Every failure carries an [`ErrorCode`] for programmatic handling plus
//! optional context (operation, field, SQL, suggestions) for humans.
//!
//! # Error Codes
//!
//! Codes follow the pattern `Q{category}{number}`:
//! - 1xxx: Predicate shape errors (invalid argument, mixed connectives, sub-queries)
//! - 2xxx: Dialect configuration errors (missing templates, unsupported operators)
//! - 3xxx: Data errors (binding category conversion)
//! - 4xxx: Execution errors (driver failures)
//!
//! ```rust
//! use quarry_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unsupported_operator("regexp", "sqlite");
//! assert_eq!(err.code, ErrorCode::UnsupportedOperator);
//! assert_eq!(err.code.code(), "Q2001");
//! assert!(err.is_configuration_error());
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Predicate shape errors (1xxx)
    /// Malformed argument for an operator (Q1001).
    InvalidArgument = 1001,
    /// A second, different connective was used on one predicate node (Q1002).
    MixedConnective = 1002,
    /// A sub-query was used with an operator or kind that cannot hold it (Q1003).
    InvalidSubQuery = 1003,

    // Dialect configuration errors (2xxx)
    /// The active dialect has no template for an operator (Q2001).
    UnsupportedOperator = 2001,
    /// The active dialect is missing a clause template (Q2002).
    MissingClause = 2002,
    /// The active dialect is missing a statement template (Q2003).
    MissingStatement = 2003,
    /// A template has the wrong number of slots (Q2004).
    InvalidTemplate = 2004,
    /// No dialect is registered under the requested name (Q2005).
    UnknownDialect = 2005,
    /// A dialect document could not be parsed (Q2006).
    InvalidDialectConfig = 2006,

    // Data errors (3xxx)
    /// A value cannot be coerced to its column's binding category (Q3001).
    ConversionFailure = 3001,

    // Execution errors (4xxx)
    /// The driver reported a failure (Q4001).
    DatabaseError = 4001,
    /// The statement was used after being closed (Q4002).
    StatementClosed = 4002,
}

impl ErrorCode {
    /// Get the error code string (e.g., "Q1001").
    pub fn code(&self) -> String {
        format!("Q{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "Invalid argument",
            Self::MixedConnective => "Mixed connectives on one predicate",
            Self::InvalidSubQuery => "Invalid sub-query condition",
            Self::UnsupportedOperator => "Operator not supported by dialect",
            Self::MissingClause => "Dialect clause template missing",
            Self::MissingStatement => "Dialect statement template missing",
            Self::InvalidTemplate => "Malformed dialect template",
            Self::UnknownDialect => "Unknown dialect",
            Self::InvalidDialectConfig => "Invalid dialect configuration",
            Self::ConversionFailure => "Value conversion failure",
            Self::DatabaseError => "Database error",
            Self::StatementClosed => "Statement closed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The dialect involved.
    pub dialect: Option<String>,
    /// The SQL statement (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur during query operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(mut self, text: impl Into<String>, code: impl Into<String>) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the dialect.
    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.context.dialect = Some(dialect.into());
        self
    }

    /// Set the SQL statement.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an invalid argument error.
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidArgument,
            format!("Invalid argument for {}: {}", field, message),
        )
        .with_field(&field)
    }

    /// Create a wrong-arity error for `BETWEEN`-style operators.
    pub fn range_arity(field: impl Into<String>, operator: &str, got: usize) -> Self {
        Self::invalid_argument(
            field,
            format!("{} expects exactly 2 values, got {}", operator, got),
        )
        .with_code_suggestion(
            "Pass a two-element list of bounds",
            "Expression::between(\"age\", 18, 65)",
        )
    }

    /// Create a mixed connective error.
    pub fn mixed_connective(fixed: &str, attempted: &str) -> Self {
        Self::new(
            ErrorCode::MixedConnective,
            format!(
                "Predicate node is already joined with {}; cannot add a condition with {}",
                fixed, attempted
            ),
        )
        .with_suggestion("Open a nested group for conditions with a different connective")
        .with_code_suggestion(
            "Wrap the alternative conditions in a group",
            "p.also(\"a\", 1)?.group(Connective::Or, |g| { g.either(\"b\", 2)?; Ok(()) })?",
        )
    }

    /// Create an invalid sub-query error.
    pub fn invalid_sub_query(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidSubQuery,
            format!("Invalid sub-query condition on {}: {}", field, message.into()),
        )
        .with_field(&field)
        .with_help("Sub-queries are accepted by IN, NOT IN, = and <> and must be SELECT statements")
    }

    /// Create an unsupported operator error.
    pub fn unsupported_operator(operator: impl Into<String>, dialect: impl Into<String>) -> Self {
        let operator = operator.into();
        let dialect = dialect.into();
        Self::new(
            ErrorCode::UnsupportedOperator,
            format!("Dialect '{}' has no template for '{}'", dialect, operator),
        )
        .with_dialect(&dialect)
        .with_suggestion(format!("Add an entry for '{}' to the dialect's operator table", operator))
    }

    /// Create a missing clause error.
    pub fn missing_clause(clause: impl Into<String>, dialect: impl Into<String>) -> Self {
        let clause = clause.into();
        let dialect = dialect.into();
        Self::new(
            ErrorCode::MissingClause,
            format!("Dialect '{}' is missing the '{}' clause template", dialect, clause),
        )
        .with_dialect(&dialect)
    }

    /// Create a missing statement error.
    pub fn missing_statement(kind: impl Into<String>, dialect: impl Into<String>) -> Self {
        let kind = kind.into();
        let dialect = dialect.into();
        Self::new(
            ErrorCode::MissingStatement,
            format!("Dialect '{}' is missing the '{}' statement template", dialect, kind),
        )
        .with_dialect(&dialect)
    }

    /// Create an invalid template error.
    pub fn invalid_template(template: impl Into<String>, expected: usize, found: usize) -> Self {
        let template = template.into();
        Self::new(
            ErrorCode::InvalidTemplate,
            format!(
                "Template '{}' has {} slot(s), expected {}",
                template, found, expected
            ),
        )
    }

    /// Create an unknown dialect error.
    pub fn unknown_dialect(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorCode::UnknownDialect, format!("No dialect registered as '{}'", name))
            .with_dialect(&name)
            .with_suggestion("Register the dialect with DialectRegistry::register first")
    }

    /// Create an invalid dialect configuration error.
    pub fn invalid_dialect_config(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidDialectConfig,
            format!("Invalid dialect configuration: {}", message.into()),
        )
    }

    /// Create a conversion failure error.
    pub fn conversion_failure(
        field: impl Into<String>,
        category: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::ConversionFailure,
            format!(
                "Cannot bind value for {} as {}: {}",
                field,
                category,
                message.into()
            ),
        )
        .with_field(&field)
        .with_suggestion("Check the declared column type against the value being bound")
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create a statement closed error.
    pub fn statement_closed() -> Self {
        Self::new(
            ErrorCode::StatementClosed,
            "Statement was closed before it could be executed",
        )
    }

    // ============== Error Checks ==============

    /// Check if this is a predicate shape error.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidArgument | ErrorCode::MixedConnective | ErrorCode::InvalidSubQuery
        )
    }

    /// Check if this is a dialect configuration error.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnsupportedOperator
                | ErrorCode::MissingClause
                | ErrorCode::MissingStatement
                | ErrorCode::InvalidTemplate
                | ErrorCode::UnknownDialect
                | ErrorCode::InvalidDialectConfig
        )
    }

    /// Check if this is a conversion failure.
    pub fn is_conversion_failure(&self) -> bool {
        self.code == ErrorCode::ConversionFailure
    }

    /// Check if this error came from the driver.
    pub fn is_database_error(&self) -> bool {
        self.code == ErrorCode::DatabaseError
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref dialect) = self.context.dialect {
            output.push_str(&format!("  → Dialect: {}\n", dialect));
        }

        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.chars().count() > 200 {
                format!("{}...", sql.chars().take(200).collect::<String>())
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!(
                        "     ```\n     {}\n     ```\n",
                        code.replace('\n', "\n     ")
                    ));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}
