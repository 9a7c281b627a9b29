//! Rendering queries into dialect SQL with ordered parameters.
//!
//! The renderer walks the statement template left to right and resolves each
//! `{slot}` as it is reached, pushing parameters onto one shared list. Every
//! placeholder is emitted at the moment its parameter is pushed, so the
//! parameter order always equals the textual order of placeholders, including
//! inside nested groups, functions and sub-queries.

use std::borrow::Cow;
use tracing::debug;

use crate::binding::TypeRegistry;
use crate::dialect::{Dialect, LimitOrder};
use crate::error::{QueryError, QueryResult};
use crate::expression::{Expression, Operand, Operator, Subject};
use crate::function::{Argument, Function};
use crate::join::Join;
use crate::predicate::{Node, Predicate};
use crate::query::{Query, QueryKind};
use crate::row::ALIAS_SEPARATOR;
use crate::sql::fill;
use crate::statement::interpolate;
use crate::types::Selection;
use crate::value::{Param, Value};

/// Rendered SQL plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL with positional placeholders.
    pub sql: String,
    /// Parameters, one per placeholder, in textual order.
    pub params: Vec<Param>,
}

impl Statement {
    /// The SQL with parameters inlined as literals. For logs only.
    pub fn debug_sql(&self, dialect: &Dialect) -> String {
        interpolate(&self.sql, &self.params, dialect.placeholder, dialect.quotes())
    }
}

/// Renders [`Query`] values for one dialect.
///
/// ```rust
/// use quarry_query::{BindingCategory, Dialect, Query, Renderer, TypeRegistry};
///
/// # fn main() -> quarry_query::QueryResult<()> {
/// let dialect = Dialect::sqlite();
/// let types = TypeRegistry::new();
/// let renderer = Renderer::new(&dialect, &types);
///
/// let query = Query::select("users").r#where(|p| {
///     p.also("id", 5)?;
///     Ok(())
/// })?;
/// let statement = renderer.render(&query)?;
///
/// assert_eq!(statement.sql, r#"SELECT * FROM "users" WHERE "id" = ?"#);
/// assert_eq!(statement.params[0].category, BindingCategory::Integer);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    dialect: &'a Dialect,
    types: &'a TypeRegistry,
}

impl<'a> Renderer<'a> {
    /// Create a renderer.
    pub fn new(dialect: &'a Dialect, types: &'a TypeRegistry) -> Self {
        Self { dialect, types }
    }

    /// The dialect in use.
    pub fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    /// The type registry in use.
    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    /// Render a query.
    pub fn render(&self, query: &Query) -> QueryResult<Statement> {
        let mut params = Vec::new();
        let sql = self.render_into(query, &mut params).map_err(|e| {
            e.with_context(format!("Rendering {} on {}", query.kind(), query.table()))
                .with_dialect(&self.dialect.name)
        })?;
        debug!(
            kind = %query.kind(),
            dialect = %self.dialect.name,
            sql_len = sql.len(),
            params = params.len(),
            "Rendered statement"
        );
        Ok(Statement { sql, params })
    }

    fn render_into(&self, query: &Query, params: &mut Vec<Param>) -> QueryResult<String> {
        // write templates address the bare table name
        if let Some(alias) = query.explicit_alias() {
            if !query.kind().is_read() && alias != query.table() {
                return Err(QueryError::invalid_argument(
                    alias,
                    format!("{} statements cannot alias their table", query.kind()),
                ));
            }
        }
        let template = self.dialect.statement(query.kind())?;
        let mut parts = Vec::new();
        for token in template.split_whitespace() {
            let rendered = self.expand_token(token, query, params)?;
            if !rendered.is_empty() {
                parts.push(rendered);
            }
        }
        Ok(parts.join(" "))
    }

    /// Substitute the `{slot}`s of one whitespace-separated template token.
    fn expand_token(&self, token: &str, query: &Query, params: &mut Vec<Param>) -> QueryResult<String> {
        let mut out = String::new();
        let mut rest = token;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            out.push_str(&rest[..open]);
            let slot = &rest[open + 1..open + close];
            out.push_str(&self.slot(slot, query, params)?);
            rest = &rest[open + close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn slot(&self, slot: &str, query: &Query, params: &mut Vec<Param>) -> QueryResult<String> {
        match slot {
            "fields" => self.fields(query, params),
            "values" => self.values(query, params),
            "source" => self.aliased(query.table(), query.explicit_alias()),
            "table" => Ok(self.dialect.quote(query.table())),
            "joins" => self.joins(query),
            "where" => self.predicate_clause("where", query.where_predicate(), query, params),
            "having" => self.predicate_clause("having", query.having_predicate(), query, params),
            "group" => self.group(query),
            "order" => self.order(query),
            "limit" => self.limit(query),
            other => Err(QueryError::invalid_dialect_config(format!(
                "statement '{}' uses unknown slot '{{{}}}'",
                query.kind(),
                other
            ))),
        }
    }

    fn fields(&self, query: &Query, params: &mut Vec<Param>) -> QueryResult<String> {
        match query.kind() {
            QueryKind::Select | QueryKind::Count => self.select_list(query, params),
            QueryKind::Insert => {
                let data = non_empty_data(query)?;
                Ok(data
                    .keys()
                    .map(|column| self.dialect.quote(column))
                    .collect::<Vec<_>>()
                    .join(", "))
            }
            QueryKind::Update => {
                let template = self.dialect.operator(Operator::Eq)?;
                let mut pairs = Vec::with_capacity(query.data().len());
                for (column, value) in non_empty_data(query)? {
                    let placeholder = self.bind(column, query.declared_type(column), value.clone(), params)?;
                    pairs.push(fill(template, &[&self.dialect.quote(column), &placeholder])?);
                }
                Ok(pairs.join(", "))
            }
            QueryKind::Delete => Ok(String::new()),
        }
    }

    fn values(&self, query: &Query, params: &mut Vec<Param>) -> QueryResult<String> {
        let mut placeholders = Vec::with_capacity(query.data().len());
        for (column, value) in non_empty_data(query)? {
            placeholders.push(self.bind(column, query.declared_type(column), value.clone(), params)?);
        }
        Ok(placeholders.join(", "))
    }

    fn select_list(&self, query: &Query, params: &mut Vec<Param>) -> QueryResult<String> {
        let joined = !query.joins().is_empty();
        if query.selections().is_empty() && !joined {
            return Ok("*".to_string());
        }

        let primary = query.alias_name();
        let mut items = Vec::new();
        if query.selections().is_empty() {
            items.push(self.dialect.quote(&format!("{}.*", primary)));
        }
        for selection in query.selections() {
            items.push(match selection {
                Selection::Field(name) if joined && !name.contains('.') => {
                    self.dialect.quote(&format!("{}.{}", primary, name))
                }
                Selection::Field(name) => self.dialect.quote(name),
                Selection::Function { function, alias } => {
                    self.labelled_function(function, alias.as_deref(), params)?
                }
            });
        }

        for join in query.joins() {
            let alias = join.alias_name();
            for selection in join.selections() {
                items.push(match selection {
                    Selection::Field(name) => {
                        let column = name.rsplit('.').next().unwrap_or(name);
                        let qualified = if name.contains('.') {
                            self.dialect.quote(name)
                        } else {
                            self.dialect.quote(&format!("{}.{}", alias, name))
                        };
                        let label = format!("{}{}{}", alias, ALIAS_SEPARATOR, column);
                        fill(self.dialect.clause("alias")?, &[&qualified, &self.dialect.quote(&label)])?
                    }
                    Selection::Function { function, alias } => {
                        self.labelled_function(function, alias.as_deref(), params)?
                    }
                });
            }
        }
        Ok(items.join(", "))
    }

    fn labelled_function(
        &self,
        function: &Function,
        alias: Option<&str>,
        params: &mut Vec<Param>,
    ) -> QueryResult<String> {
        let sql = self.function(function, params)?;
        match alias {
            Some(alias) => fill(self.dialect.clause("alias")?, &[&sql, &self.dialect.quote(alias)]),
            None => Ok(sql),
        }
    }

    fn function(&self, function: &Function, params: &mut Vec<Param>) -> QueryResult<String> {
        let mut args = Vec::with_capacity(function.arguments().len());
        for argument in function.arguments() {
            args.push(match argument {
                Argument::Plain(value) => self.bind(function.name(), None, value.clone(), params)?.into_owned(),
                Argument::Literal(sql) => sql.clone(),
                Argument::Field(name) => self.dialect.quote(name),
            });
        }
        Ok(format!("{}({})", function.name(), args.join(function.separator_str())))
    }

    fn aliased(&self, table: &str, alias: Option<&str>) -> QueryResult<String> {
        let quoted = self.dialect.quote(table);
        match alias {
            Some(alias) if alias != table => {
                fill(self.dialect.clause("alias")?, &[&quoted, &self.dialect.quote(alias)])
            }
            _ => Ok(quoted),
        }
    }

    fn joins(&self, query: &Query) -> QueryResult<String> {
        let mut rendered = Vec::with_capacity(query.joins().len());
        for join in query.joins() {
            rendered.push(self.join(query, join)?);
        }
        Ok(rendered.join(" "))
    }

    fn join(&self, query: &Query, join: &Join) -> QueryResult<String> {
        let keyword = self.dialect.join_keyword(join.kind())?;
        let target = self.aliased(join.table(), Some(join.alias_name()))?;

        let mut conditions = Vec::new();
        let eq = self.dialect.operator(Operator::Eq)?;
        for (local, foreign) in join.conditions() {
            let lhs = qualify(local, query.alias_name());
            let rhs = qualify(foreign, join.alias_name());
            conditions.push(fill(eq, &[&self.dialect.quote(&lhs), &self.dialect.quote(&rhs)])?);
        }

        if conditions.is_empty() {
            return fill(self.dialect.clause("join_plain")?, &[keyword, &target]);
        }
        let and = format!(" {} ", self.dialect.connective(crate::predicate::Connective::And)?);
        fill(self.dialect.clause("join")?, &[keyword, &target, &conditions.join(&and)])
    }

    fn predicate_clause(
        &self,
        clause: &str,
        predicate: &Predicate,
        query: &Query,
        params: &mut Vec<Param>,
    ) -> QueryResult<String> {
        if predicate.is_empty() {
            return Ok(String::new());
        }
        crate::quarry_trace!(clause, children = predicate.len(), "Rendering predicate clause");
        let body = self.predicate(predicate, query, params)?;
        if body.is_empty() {
            return Ok(String::new());
        }
        fill(self.dialect.clause(clause)?, &[&body])
    }

    /// Render a predicate node. The top level is bare; nested nodes are
    /// parenthesized by their parent.
    pub fn predicate(&self, node: &Predicate, query: &Query, params: &mut Vec<Param>) -> QueryResult<String> {
        let keyword = self.dialect.connective(node.connective())?;
        let mut parts = Vec::with_capacity(node.len());
        for child in node.children() {
            match child {
                Node::Expression(expression) => parts.push(self.expression(expression, query, params)?),
                Node::Group(group) => {
                    let inner = self.predicate(group, query, params)?;
                    if !inner.is_empty() {
                        parts.push(format!("({})", inner));
                    }
                }
            }
        }
        Ok(parts.join(&format!(" {} ", keyword)))
    }

    fn expression(&self, expression: &Expression, query: &Query, params: &mut Vec<Param>) -> QueryResult<String> {
        let operator = expression.operator();
        let template = self.dialect.operator(operator)?;

        // Empty lists short-circuit before anything is bound.
        if let Operand::List(items) = expression.operand() {
            if items.is_empty() {
                return Ok(match operator {
                    Operator::NotIn => "1 = 1".to_string(),
                    _ => "1 = 0".to_string(),
                });
            }
        }

        let subject = self.subject(expression.subject(), params)?;
        let label = expression.subject().describe();
        let declared = expression
            .subject()
            .field_name()
            .and_then(|field| query.declared_type(field));

        match expression.operand() {
            Operand::None => fill(template, &[&subject]),
            Operand::Single(value) => {
                let p = self.bind(&label, declared, value.clone(), params)?;
                fill(template, &[&subject, &p])
            }
            Operand::Range(low, high) => {
                let low = self.bind(&label, declared, low.clone(), params)?;
                let high = self.bind(&label, declared, high.clone(), params)?;
                fill(template, &[&subject, &low, &high])
            }
            Operand::List(items) => {
                let mut placeholders = Vec::with_capacity(items.len());
                for item in items {
                    placeholders.push(self.bind(&label, declared, item.clone(), params)?);
                }
                fill(template, &[&subject, &placeholders.join(", ")])
            }
            Operand::SubQuery(inner) => {
                let sql = self.render_into(inner, params)?;
                let sql = if operator.is_list() {
                    sql
                } else {
                    format!("({})", sql)
                };
                fill(template, &[&subject, &sql])
            }
        }
    }

    fn subject(&self, subject: &Subject, params: &mut Vec<Param>) -> QueryResult<String> {
        match subject {
            Subject::Field(name) => Ok(self.dialect.quote(name)),
            Subject::Function(function) => self.function(function, params),
        }
    }

    fn group(&self, query: &Query) -> QueryResult<String> {
        if query.grouping().is_empty() {
            return Ok(String::new());
        }
        let columns: Vec<String> = query.grouping().iter().map(|c| self.dialect.quote(c)).collect();
        fill(self.dialect.clause("group")?, &[&columns.join(", ")])
    }

    fn order(&self, query: &Query) -> QueryResult<String> {
        if query.ordering().is_empty() {
            return Ok(String::new());
        }
        let columns: Vec<String> = query
            .ordering()
            .iter()
            .map(|(column, order)| format!("{} {}", self.dialect.quote(column), order.as_sql()))
            .collect();
        fill(self.dialect.clause("order")?, &[&columns.join(", ")])
    }

    fn limit(&self, query: &Query) -> QueryResult<String> {
        let limit = query.limit_value();
        if limit == 0 {
            return Ok(String::new());
        }
        let offset = query.offset_value();
        if offset == 0 {
            return fill(self.dialect.clause("limit")?, &[&limit.to_string()]);
        }
        let (limit, offset) = (limit.to_string(), offset.to_string());
        let template = self.dialect.clause("limit_offset")?;
        match self.dialect.limit_order {
            LimitOrder::OffsetFirst => fill(template, &[&offset, &limit]),
            LimitOrder::LimitFirst => fill(template, &[&limit, &offset]),
        }
    }

    /// Push a parameter and return its placeholder.
    fn bind(
        &self,
        field: &str,
        declared: Option<&str>,
        value: Value,
        params: &mut Vec<Param>,
    ) -> QueryResult<Cow<'static, str>> {
        if value.is_list() {
            return Err(QueryError::invalid_argument(
                field,
                "a list cannot be bound as a single parameter",
            ));
        }
        params.push(self.types.bind(field, declared, value)?);
        Ok(self.dialect.placeholder(params.len()))
    }
}

fn qualify(name: &str, alias: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{}.{}", alias, name)
    }
}

fn non_empty_data(query: &Query) -> QueryResult<&indexmap::IndexMap<String, Value>> {
    if query.data().is_empty() {
        return Err(QueryError::invalid_argument(
            query.table(),
            format!("{} requires at least one column value", query.kind()),
        )
        .with_suggestion("Add values with Query::set(field, value)"));
    }
    Ok(query.data())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::function::functions;
    use crate::predicate::Connective;
    use crate::types::SortOrder;
    use crate::value::BindingCategory;
    use pretty_assertions::assert_eq;

    fn render(dialect: &Dialect, query: &Query) -> Statement {
        let types = TypeRegistry::new();
        Renderer::new(dialect, &types).render(query).unwrap()
    }

    #[test]
    fn test_simple_select() {
        let q = Query::select("users")
            .r#where(|p| {
                p.also("id", 5)?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::sqlite(), &q);
        assert_eq!(s.sql, r#"SELECT * FROM "users" WHERE "id" = ?"#);
        assert_eq!(s.params, vec![Param::new(Value::Int(5), BindingCategory::Integer)]);
    }

    #[test]
    fn test_nested_group_order() {
        let q = Query::select("t")
            .r#where(|p| {
                p.also("a", 1)?.group(Connective::Or, |g| {
                    g.either("b", 2)?.either("b", 3)?;
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::standard(), &q);
        assert_eq!(s.sql, r#"SELECT * FROM "t" WHERE "a" = ? AND ("b" = ? OR "b" = ?)"#);
        let values: Vec<_> = s.params.iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_operators() {
        let q = Query::select("t")
            .r#where(|p| {
                p.also("id", vec![1, 2, 3])?
                    .also("deleted_at", Value::Null)?
                    .also_op("age", Operator::Between, vec![18, 65])?
                    .also_op("name", Operator::NotLike, "x%")?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::standard(), &q);
        assert_eq!(
            s.sql,
            r#"SELECT * FROM "t" WHERE "id" IN (?, ?, ?) AND "deleted_at" IS NULL AND "age" BETWEEN ? AND ? AND "name" NOT LIKE ?"#
        );
        assert_eq!(s.params.len(), 6);
    }

    #[test]
    fn test_empty_in_lists() {
        let q = Query::select("t")
            .r#where(|p| {
                p.also_op("id", Operator::In, Vec::<i64>::new())?
                    .also_op("id", Operator::NotIn, Vec::<i64>::new())?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::standard(), &q);
        assert_eq!(s.sql, r#"SELECT * FROM "t" WHERE 1 = 0 AND 1 = 1"#);
        assert!(s.params.is_empty());
    }

    #[test]
    fn test_postgres_numbering_and_limit() {
        let q = Query::select("t")
            .r#where(|p| {
                p.also("a", 1)?.also("b", "x")?;
                Ok(())
            })
            .unwrap()
            .order_by("a", SortOrder::Desc)
            .limit(10)
            .offset(20);
        let s = render(&Dialect::postgres(), &q);
        assert_eq!(
            s.sql,
            r#"SELECT * FROM "t" WHERE "a" = $1 AND "b" = $2 ORDER BY "a" DESC LIMIT 10 OFFSET 20"#
        );

        let s = render(&Dialect::standard(), &q);
        assert!(s.sql.ends_with("LIMIT 20, 10"));
    }

    #[test]
    fn test_identifiers_cannot_close_their_quotes() {
        let q = Query::select("users").order_by("name\" ; DROP TABLE users; --", SortOrder::Asc);
        let s = render(&Dialect::standard(), &q);
        assert_eq!(s.sql, r#"SELECT * FROM "users" ORDER BY "name"" ; DROP TABLE users; --" ASC"#);

        let q = Query::select("t")
            .r#where(|p| {
                p.also("a` = 1 OR `b", 2)?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::mysql(), &q);
        assert_eq!(s.sql, "SELECT * FROM `t` WHERE `a`` = 1 OR ``b` = ?");
    }

    #[test]
    fn test_zero_limit_is_dropped() {
        let s = render(&Dialect::standard(), &Query::select("t").offset(5));
        assert_eq!(s.sql, r#"SELECT * FROM "t""#);
        let s = render(&Dialect::standard(), &Query::select("t").limit(3));
        assert_eq!(s.sql, r#"SELECT * FROM "t" LIMIT 3"#);
    }

    #[test]
    fn test_join_select() {
        let q = Query::select("users")
            .alias("User")
            .fields(["id", "name"])
            .join(
                Join::left("posts")
                    .alias("Post")
                    .fields(["title"])
                    .on("id", "author_id")
                    .on("org_id", "org_id"),
            );
        let s = render(&Dialect::standard(), &q);
        assert_eq!(
            s.sql,
            concat!(
                r#"SELECT "User"."id", "User"."name", "Post"."title" AS "Post__title" "#,
                r#"FROM "users" AS "User" LEFT JOIN "posts" AS "Post" "#,
                r#"ON "User"."id" = "Post"."author_id" AND "User"."org_id" = "Post"."org_id""#
            )
        );
    }

    #[test]
    fn test_join_without_conditions_or_fields() {
        let q = Query::select("a").join(Join::inner("b"));
        let s = render(&Dialect::standard(), &q);
        assert_eq!(s.sql, r#"SELECT "a".* FROM "a" INNER JOIN "b""#);
    }

    #[test]
    fn test_unsupported_join_kind() {
        let q = Query::select("a").join(Join::new(crate::join::JoinKind::Straight, "b"));
        let types = TypeRegistry::new();
        let err = Renderer::new(&Dialect::postgres(), &types).render(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperator);
    }

    #[test]
    fn test_count() {
        let q = Query::count("users")
            .r#where(|p| {
                p.also("active", true)?;
                Ok(())
            })
            .unwrap()
            .fields(["ignored"]);
        let s = render(&Dialect::sqlite(), &q);
        assert_eq!(s.sql, r#"SELECT COUNT(*) AS count FROM "users" WHERE "active" = ?"#);
        assert_eq!(s.params[0].category, BindingCategory::Boolean);
    }

    #[test]
    fn test_insert_update_delete() {
        let insert = Query::insert("users").set("name", "ann").set("age", 30);
        let s = render(&Dialect::sqlite(), &insert);
        assert_eq!(s.sql, r#"INSERT INTO "users" ("name", "age") VALUES (?, ?)"#);
        assert_eq!(s.params.len(), 2);

        let update = Query::update("users")
            .set("name", "bob")
            .r#where(|p| {
                p.also("id", 7)?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::postgres(), &update);
        assert_eq!(s.sql, r#"UPDATE "users" SET "name" = $1 WHERE "id" = $2"#);
        assert_eq!(s.params[0].value, Value::from("bob"));
        assert_eq!(s.params[1].value, Value::Int(7));

        let delete = Query::delete("users").alias("users");
        let s = render(&Dialect::mysql(), &delete);
        assert_eq!(s.sql, "DELETE FROM `users`");
    }

    #[test]
    fn test_writes_reject_table_alias() {
        let types = TypeRegistry::new();
        let dialect = Dialect::mysql();
        let renderer = Renderer::new(&dialect, &types);
        let writes = [
            Query::delete("users").alias("U"),
            Query::update("users").alias("U").set("name", "bob"),
            Query::insert("users").alias("U").set("name", "bob"),
        ];
        for query in &writes {
            let err = renderer.render(query).unwrap_err();
            assert!(err.is_invalid_argument(), "{}", query.kind());
            assert_eq!(err.context.field.as_deref(), Some("U"));
        }
        assert!(renderer.render(&Query::count("users").alias("U")).is_ok());
    }

    #[test]
    fn test_insert_without_data_fails() {
        let types = TypeRegistry::new();
        let err = Renderer::new(&Dialect::sqlite(), &types)
            .render(&Query::insert("users"))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_sub_query_params_are_spliced() {
        let banned = Query::select("bans")
            .fields(["user_id"])
            .r#where(|p| {
                p.also("reason", "spam")?;
                Ok(())
            })
            .unwrap();
        let q = Query::select("users")
            .r#where(|p| {
                p.also("active", 1)?
                    .add(Connective::And, Expression::sub_query("id", Operator::NotIn, banned)?)?
                    .also("org", 9)?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::postgres(), &q);
        assert_eq!(
            s.sql,
            r#"SELECT * FROM "users" WHERE "active" = $1 AND "id" NOT IN (SELECT "user_id" FROM "bans" WHERE "reason" = $2) AND "org" = $3"#
        );
        let values: Vec<_> = s.params.iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec![Value::Int(1), Value::from("spam"), Value::Int(9)]);
    }

    #[test]
    fn test_function_subject_and_selection() {
        let q = Query::select("users")
            .select_function(functions::count("*"), Some("total"))
            .r#where(|p| {
                p.also(Function::new("lower").field("email"), "a@b.c")?
                    .also(Function::new("coalesce").field("score").value(0), 10)?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::standard(), &q);
        assert_eq!(
            s.sql,
            r#"SELECT COUNT(*) AS "total" FROM "users" WHERE LOWER("email") = ? AND COALESCE("score", ?) = ?"#
        );
        let values: Vec<_> = s.params.iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec![Value::from("a@b.c"), Value::Int(0), Value::Int(10)]);
    }

    #[test]
    fn test_declared_types_coerce() {
        let q = Query::select("users")
            .column_type("age", "INTEGER")
            .r#where(|p| {
                p.also("age", "42")?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::sqlite(), &q);
        assert_eq!(s.params, vec![Param::new(Value::Int(42), BindingCategory::Integer)]);

        let bad = Query::select("users")
            .column_type("age", "INTEGER")
            .r#where(|p| {
                p.also("age", "old")?;
                Ok(())
            })
            .unwrap();
        let types = TypeRegistry::new();
        let err = Renderer::new(&Dialect::sqlite(), &types).render(&bad).unwrap_err();
        assert!(err.is_conversion_failure());
    }

    #[test]
    fn test_huge_float_is_not_saturated_into_integer() {
        let q = Query::select("t")
            .column_type("n", "INTEGER")
            .r#where(|p| {
                p.also("n", 1e20)?;
                Ok(())
            })
            .unwrap();
        let types = TypeRegistry::new();
        let err = Renderer::new(&Dialect::sqlite(), &types).render(&q).unwrap_err();
        assert!(err.is_conversion_failure());
    }

    #[test]
    fn test_unsupported_operator_leaves_dialect_untouched() {
        let mut dialect = Dialect::standard();
        dialect.operators.shift_remove("like");
        let before = dialect.clone();
        let q = Query::select("t")
            .r#where(|p| {
                p.also_op("name", Operator::Like, "a%")?;
                Ok(())
            })
            .unwrap();
        let types = TypeRegistry::new();
        let err = Renderer::new(&dialect, &types).render(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperator);
        assert_eq!(dialect, before);
    }

    #[test]
    fn test_xor_needs_dialect_support() {
        let q = Query::select("t")
            .r#where(|p| {
                p.maybe("a", 1)?.maybe("b", 2)?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::mysql(), &q);
        assert_eq!(s.sql, "SELECT * FROM `t` WHERE `a` = ? XOR `b` = ?");

        let types = TypeRegistry::new();
        assert!(Renderer::new(&Dialect::sqlite(), &types).render(&q).is_err());
    }

    #[test]
    fn test_group_having() {
        let q = Query::select("orders")
            .fields(["customer_id"])
            .select_function(functions::sum("total"), Some("spent"))
            .group_by(["customer_id"])
            .having(|p| {
                p.also_op(functions::sum("total"), Operator::Gt, 100)?;
                Ok(())
            })
            .unwrap();
        let s = render(&Dialect::standard(), &q);
        assert_eq!(
            s.sql,
            r#"SELECT "customer_id", SUM("total") AS "spent" FROM "orders" GROUP BY "customer_id" HAVING SUM("total") > ?"#
        );
    }
}
