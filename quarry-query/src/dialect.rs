//! SQL dialects as data.
//!
//! A [`Dialect`] is a set of tables: clause templates with `%s` slots,
//! statement templates with `{name}` slots, and keyword tables for operators,
//! connectives and joins. The renderer only looks things up here, so adding a
//! dialect means writing configuration rather than code.
//!
//! Dialects come from the built-ins or from TOML:
//!
//! ```rust
//! use quarry_query::{Dialect, PlaceholderStyle};
//!
//! let dialect = Dialect::from_toml_str(r#"
//!     name = "cockroach"
//!     extend = "postgres"
//!
//!     [operators]
//!     regexp = "%s ~* %s"
//! "#).unwrap();
//!
//! assert_eq!(dialect.placeholder, PlaceholderStyle::Numbered);
//! assert_eq!(dialect.operators["regexp"], "%s ~* %s");
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::expression::Operator;
use crate::join::JoinKind;
use crate::predicate::Connective;
use crate::query::QueryKind;
use crate::sql::{self, slot_count, statement_slots};

/// Clause templates every dialect must define, with their slot counts.
pub const REQUIRED_CLAUSES: &[(&str, usize)] = &[
    ("where", 1),
    ("having", 1),
    ("group", 1),
    ("order", 1),
    ("limit", 1),
    ("limit_offset", 2),
    ("join", 3),
    ("join_plain", 2),
    ("alias", 2),
];

/// Slot names a statement template may use.
pub const STATEMENT_SLOTS: &[&str] = &[
    "fields", "source", "table", "joins", "where", "group", "having", "order", "limit", "values",
];

const OPTIONAL_OPERATORS: &[Operator] = &[Operator::Regexp, Operator::NotRegexp];
const OPTIONAL_JOINS: &[JoinKind] = &[JoinKind::Outer, JoinKind::Straight];

/// How bound parameters are written into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `?` for every parameter.
    Question,
    /// `$1`, `$2`, ... numbered from one.
    Numbered,
}

impl PlaceholderStyle {
    /// Render the placeholder for the given 1-based index.
    #[inline]
    pub fn render(&self, index: usize) -> Cow<'static, str> {
        match self {
            Self::Question => Cow::Borrowed("?"),
            Self::Numbered => Cow::Owned(format!("${}", index)),
        }
    }
}

/// Argument order of the `limit_offset` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitOrder {
    /// `LIMIT offset, limit`
    OffsetFirst,
    /// `LIMIT limit OFFSET offset`
    LimitFirst,
}

/// A SQL dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialect {
    /// Registry name.
    pub name: String,
    /// Opening identifier quote.
    pub open_quote: char,
    /// Closing identifier quote.
    pub close_quote: char,
    /// Placeholder style.
    pub placeholder: PlaceholderStyle,
    /// Argument order of `limit_offset`.
    pub limit_order: LimitOrder,
    /// Clause templates keyed by clause name.
    pub clauses: IndexMap<String, String>,
    /// Statement templates keyed by [`QueryKind::as_str`].
    pub statements: IndexMap<String, String>,
    /// Operator templates keyed by [`Operator::key`].
    pub operators: IndexMap<String, String>,
    /// Connective keywords keyed by [`Connective::key`].
    pub connectives: IndexMap<String, String>,
    /// Join keywords keyed by [`JoinKind::key`].
    pub joins: IndexMap<String, String>,
}

/// TOML shape of a dialect; every table merges over the base.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DialectFile {
    name: String,
    extend: Option<String>,
    open_quote: Option<char>,
    close_quote: Option<char>,
    placeholder: Option<PlaceholderStyle>,
    limit_order: Option<LimitOrder>,
    #[serde(default)]
    clauses: IndexMap<String, String>,
    #[serde(default)]
    statements: IndexMap<String, String>,
    #[serde(default)]
    operators: IndexMap<String, String>,
    #[serde(default)]
    connectives: IndexMap<String, String>,
    #[serde(default)]
    joins: IndexMap<String, String>,
}

fn table(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

impl Dialect {
    fn base(name: &str, quote: (char, char)) -> Self {
        Self {
            name: name.to_string(),
            open_quote: quote.0,
            close_quote: quote.1,
            placeholder: PlaceholderStyle::Question,
            limit_order: LimitOrder::OffsetFirst,
            clauses: table(&[
                ("where", "WHERE %s"),
                ("having", "HAVING %s"),
                ("group", "GROUP BY %s"),
                ("order", "ORDER BY %s"),
                ("limit", "LIMIT %s"),
                ("limit_offset", "LIMIT %s, %s"),
                ("join", "%s %s ON %s"),
                ("join_plain", "%s %s"),
                ("alias", "%s AS %s"),
            ]),
            statements: table(&[
                (
                    "select",
                    "SELECT {fields} FROM {source} {joins} {where} {group} {having} {order} {limit}",
                ),
                (
                    "count",
                    "SELECT COUNT(*) AS count FROM {source} {joins} {where} {group} {having}",
                ),
                ("insert", "INSERT INTO {table} ({fields}) VALUES ({values})"),
                ("update", "UPDATE {table} SET {fields} {where}"),
                ("delete", "DELETE FROM {table} {where}"),
            ]),
            operators: table(&[
                ("eq", "%s = %s"),
                ("neq", "%s <> %s"),
                ("gt", "%s > %s"),
                ("gte", "%s >= %s"),
                ("lt", "%s < %s"),
                ("lte", "%s <= %s"),
                ("in", "%s IN (%s)"),
                ("not_in", "%s NOT IN (%s)"),
                ("null", "%s IS NULL"),
                ("not_null", "%s IS NOT NULL"),
                ("between", "%s BETWEEN %s AND %s"),
                ("not_between", "%s NOT BETWEEN %s AND %s"),
                ("like", "%s LIKE %s"),
                ("not_like", "%s NOT LIKE %s"),
                ("regexp", "%s REGEXP %s"),
                ("not_regexp", "%s NOT REGEXP %s"),
            ]),
            connectives: table(&[("and", "AND"), ("or", "OR"), ("xor", "XOR")]),
            joins: table(&[
                ("left", "LEFT JOIN"),
                ("right", "RIGHT JOIN"),
                ("inner", "INNER JOIN"),
                ("outer", "FULL OUTER JOIN"),
                ("straight", "STRAIGHT_JOIN"),
            ]),
        }
    }

    /// ANSI-flavoured dialect with every operator and join kind.
    pub fn standard() -> Self {
        Self::base("standard", ('"', '"'))
    }

    /// SQLite. No XOR and no straight join.
    pub fn sqlite() -> Self {
        let mut d = Self::base("sqlite", ('"', '"'));
        d.connectives.shift_remove("xor");
        d.joins.shift_remove("straight");
        d
    }

    /// MySQL / MariaDB. Backtick quoting, no full outer join.
    pub fn mysql() -> Self {
        let mut d = Self::base("mysql", ('`', '`'));
        d.joins.shift_remove("outer");
        d
    }

    /// PostgreSQL. Numbered placeholders, `LIMIT .. OFFSET ..`, `~` matching.
    pub fn postgres() -> Self {
        let mut d = Self::base("postgres", ('"', '"'));
        d.placeholder = PlaceholderStyle::Numbered;
        d.limit_order = LimitOrder::LimitFirst;
        d.clauses
            .insert("limit_offset".into(), "LIMIT %s OFFSET %s".into());
        d.operators.insert("regexp".into(), "%s ~ %s".into());
        d.operators.insert("not_regexp".into(), "%s !~ %s".into());
        d.connectives.shift_remove("xor");
        d.joins.shift_remove("straight");
        d
    }

    /// Look up a built-in dialect by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "standard" => Some(Self::standard()),
            "sqlite" => Some(Self::sqlite()),
            "mysql" | "mariadb" => Some(Self::mysql()),
            "postgres" | "postgresql" => Some(Self::postgres()),
            _ => None,
        }
    }

    /// Parse a dialect from TOML and validate it.
    ///
    /// With `extend = "<builtin>"` the document only needs the entries it
    /// overrides; without it, every required entry must be present.
    pub fn from_toml_str(source: &str) -> QueryResult<Self> {
        let file: DialectFile = toml::from_str(source).map_err(|e| {
            QueryError::invalid_dialect_config(format!("failed to parse TOML: {}", e.message()))
                .with_source(e)
        })?;

        let mut dialect = match &file.extend {
            Some(parent) => Self::builtin(parent).ok_or_else(|| QueryError::unknown_dialect(parent))?,
            None => Self {
                name: String::new(),
                open_quote: '"',
                close_quote: '"',
                placeholder: PlaceholderStyle::Question,
                limit_order: LimitOrder::OffsetFirst,
                clauses: IndexMap::new(),
                statements: IndexMap::new(),
                operators: IndexMap::new(),
                connectives: IndexMap::new(),
                joins: IndexMap::new(),
            },
        };

        dialect.name = file.name;
        if let Some(c) = file.open_quote {
            dialect.open_quote = c;
        }
        if let Some(c) = file.close_quote {
            dialect.close_quote = c;
        }
        if let Some(p) = file.placeholder {
            dialect.placeholder = p;
        }
        if let Some(o) = file.limit_order {
            dialect.limit_order = o;
        }
        dialect.clauses.extend(file.clauses);
        dialect.statements.extend(file.statements);
        dialect.operators.extend(file.operators);
        dialect.connectives.extend(file.connectives);
        dialect.joins.extend(file.joins);

        dialect.validate()?;
        debug!(dialect = %dialect.name, extend = ?file.extend, "Loaded dialect from TOML");
        Ok(dialect)
    }

    /// Check the dialect is complete and every template is well-formed.
    pub fn validate(&self) -> QueryResult<()> {
        if self.name.trim().is_empty() {
            return Err(QueryError::invalid_dialect_config("dialect name is empty"));
        }

        for (clause, slots) in REQUIRED_CLAUSES {
            let template = self.clause(clause)?;
            check_slots(template, *slots, self)?;
        }

        for kind in QueryKind::ALL {
            let template = self.statement(kind)?;
            for slot in statement_slots(template) {
                if !STATEMENT_SLOTS.contains(&slot) {
                    return Err(QueryError::invalid_dialect_config(format!(
                        "statement '{}' uses unknown slot '{{{}}}'",
                        kind, slot
                    ))
                    .with_dialect(&self.name));
                }
            }
        }

        for op in Operator::ALL {
            match self.operators.get(op.key()) {
                Some(template) => check_slots(template, 1 + op.value_slots(), self)?,
                None if OPTIONAL_OPERATORS.contains(&op) => {}
                None => return Err(QueryError::unsupported_operator(op.key(), &self.name)),
            }
        }

        for connective in [Connective::And, Connective::Or] {
            self.connective(connective)?;
        }

        for kind in JoinKind::ALL {
            if !OPTIONAL_JOINS.contains(&kind) {
                self.join_keyword(kind)?;
            }
        }

        Ok(())
    }

    /// A clause template.
    pub fn clause(&self, name: &str) -> QueryResult<&str> {
        self.clauses
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| QueryError::missing_clause(name, &self.name))
    }

    /// The statement template for a query kind.
    pub fn statement(&self, kind: QueryKind) -> QueryResult<&str> {
        self.statements
            .get(kind.as_str())
            .map(String::as_str)
            .ok_or_else(|| QueryError::missing_statement(kind.as_str(), &self.name))
    }

    /// The template for an operator.
    pub fn operator(&self, operator: Operator) -> QueryResult<&str> {
        self.operators
            .get(operator.key())
            .map(String::as_str)
            .ok_or_else(|| QueryError::unsupported_operator(operator.key(), &self.name))
    }

    /// The keyword for a connective.
    pub fn connective(&self, connective: Connective) -> QueryResult<&str> {
        self.connectives
            .get(connective.key())
            .map(String::as_str)
            .ok_or_else(|| QueryError::unsupported_operator(connective.key(), &self.name))
    }

    /// The keyword for a join kind.
    pub fn join_keyword(&self, kind: JoinKind) -> QueryResult<&str> {
        self.joins
            .get(kind.key())
            .map(String::as_str)
            .ok_or_else(|| QueryError::unsupported_operator(format!("{} join", kind), &self.name))
    }

    /// Quote a possibly dotted identifier.
    pub fn quote(&self, name: &str) -> String {
        sql::quote_identifier(name, self.open_quote, self.close_quote)
    }

    /// The identifier quote pair as `(open, close)`.
    pub fn quotes(&self) -> (char, char) {
        (self.open_quote, self.close_quote)
    }

    /// Render the placeholder for the given 1-based parameter index.
    pub fn placeholder(&self, index: usize) -> Cow<'static, str> {
        self.placeholder.render(index)
    }
}

fn check_slots(template: &str, expected: usize, dialect: &Dialect) -> QueryResult<()> {
    let found = slot_count(template);
    if found != expected {
        return Err(QueryError::invalid_template(template, expected, found).with_dialect(&dialect.name));
    }
    Ok(())
}

/// Dialects addressable by name.
///
/// Registration validates, so a dialect that can be looked up is complete.
#[derive(Debug, Clone, Default)]
pub struct DialectRegistry {
    dialects: IndexMap<String, Arc<Dialect>>,
}

impl DialectRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in dialect.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for dialect in [
            Dialect::standard(),
            Dialect::sqlite(),
            Dialect::mysql(),
            Dialect::postgres(),
        ] {
            let name = dialect.name.clone();
            registry.dialects.insert(name, Arc::new(dialect));
        }
        registry
    }

    /// Validate and add a dialect, replacing any dialect with the same name.
    pub fn register(&mut self, dialect: Dialect) -> QueryResult<Arc<Dialect>> {
        dialect.validate()?;
        let dialect = Arc::new(dialect);
        debug!(dialect = %dialect.name, "Registered dialect");
        self.dialects.insert(dialect.name.clone(), Arc::clone(&dialect));
        Ok(dialect)
    }

    /// Parse, validate and add a TOML dialect.
    pub fn register_toml(&mut self, source: &str) -> QueryResult<Arc<Dialect>> {
        self.register(Dialect::from_toml_str(source)?)
    }

    /// Look a dialect up by name.
    pub fn get(&self, name: &str) -> QueryResult<Arc<Dialect>> {
        self.dialects
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::unknown_dialect(name))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_builtins_validate() {
        for dialect in [
            Dialect::standard(),
            Dialect::sqlite(),
            Dialect::mysql(),
            Dialect::postgres(),
        ] {
            dialect.validate().unwrap();
        }
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::sqlite().placeholder(3), "?");
        assert_eq!(Dialect::postgres().placeholder(3), "$3");
    }

    #[test]
    fn test_quote_uses_dialect_characters() {
        assert_eq!(Dialect::mysql().quote("users.id"), "`users`.`id`");
        assert_eq!(Dialect::postgres().quote("users"), "\"users\"");
    }

    #[test]
    fn test_missing_connective_is_unsupported() {
        let err = Dialect::sqlite().connective(Connective::Xor).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperator);
        assert!(Dialect::mysql().connective(Connective::Xor).is_ok());
    }

    #[test]
    fn test_validate_catches_missing_pieces() {
        let mut d = Dialect::standard();
        d.clauses.shift_remove("having");
        assert_eq!(d.validate().unwrap_err().code, ErrorCode::MissingClause);

        let mut d = Dialect::standard();
        d.statements.shift_remove("count");
        assert_eq!(d.validate().unwrap_err().code, ErrorCode::MissingStatement);

        let mut d = Dialect::standard();
        d.operators.insert("between".into(), "%s BETWEEN %s".into());
        assert_eq!(d.validate().unwrap_err().code, ErrorCode::InvalidTemplate);

        let mut d = Dialect::standard();
        d.statements
            .insert("delete".into(), "DELETE FROM {tabel} {where}".into());
        assert_eq!(d.validate().unwrap_err().code, ErrorCode::InvalidDialectConfig);

        let mut d = Dialect::standard();
        d.operators.shift_remove("eq");
        assert_eq!(d.validate().unwrap_err().code, ErrorCode::UnsupportedOperator);
    }

    #[test]
    fn test_toml_extend() {
        let d = Dialect::from_toml_str(
            r#"
            name = "legacy"
            extend = "sqlite"
            open_quote = "["
            close_quote = "]"

            [clauses]
            limit = "LIMIT %s"

            [connectives]
            xor = "XOR"
            "#,
        )
        .unwrap();
        assert_eq!(d.name, "legacy");
        assert_eq!(d.quote("users"), "[users]");
        assert_eq!(d.connective(Connective::Xor).unwrap(), "XOR");
        assert_eq!(d.statements, Dialect::sqlite().statements);
    }

    #[test]
    fn test_toml_errors() {
        let err = Dialect::from_toml_str("name = ").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDialectConfig);
        assert!(std::error::Error::source(&err).is_some());

        let err = Dialect::from_toml_str("name = \"x\"\nextend = \"oracle\"").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownDialect);

        // Standalone documents must be complete.
        let err = Dialect::from_toml_str("name = \"bare\"").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingClause);
    }

    #[test]
    fn test_registry() {
        let mut registry = DialectRegistry::with_builtins();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            ["standard", "sqlite", "mysql", "postgres"]
        );
        assert_eq!(registry.get("mysql").unwrap().open_quote, '`');
        assert_eq!(registry.get("db2").unwrap_err().code, ErrorCode::UnknownDialect);

        let mut broken = Dialect::standard();
        broken.name = "broken".into();
        broken.statements.clear();
        assert!(registry.register(broken).is_err());
        assert!(registry.get("broken").is_err());
    }
}
