//! Predicate trees for building WHERE and HAVING clauses.
//!
//! A [`Predicate`] is one node of the tree: a connective plus an ordered list
//! of children, each either an [`Expression`] or a nested node. The
//! connective is fixed by the first condition added; adding a condition with
//! a different connective is an error, so alternatives have to be opened as
//! an explicit group.
//!
//! ```rust
//! use quarry_query::{Connective, Predicate};
//!
//! # fn main() -> quarry_query::QueryResult<()> {
//! let mut p = Predicate::new();
//! p.also("active", true)?
//!     .group(Connective::Or, |g| {
//!         g.either("role", "admin")?.either("role", "owner")?;
//!         Ok(())
//!     })?;
//!
//! assert_eq!(p.connective(), Connective::And);
//! assert_eq!(p.len(), 2);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::expression::{Expression, Operator, Subject};
use crate::query::Query;
use crate::value::Value;

/// How the children of a predicate node are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
    /// All children must hold.
    #[default]
    And,
    /// At least one child must hold.
    Or,
    /// An odd number of children must hold.
    Xor,
}

impl Connective {
    /// Key of the connective in a dialect's connective table.
    pub fn key(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A child of a predicate node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// A single condition.
    Expression(Expression),
    /// A parenthesized sub-tree.
    Group(Predicate),
}

/// A node of a predicate tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Predicate {
    connective: Option<Connective>,
    children: Vec<Node>,
}

impl Predicate {
    /// Create an empty node whose connective is set by the first condition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty node with a fixed connective.
    pub fn with_connective(connective: Connective) -> Self {
        Self {
            connective: Some(connective),
            children: Vec::new(),
        }
    }

    /// Build an AND node from expressions.
    pub fn all(expressions: impl IntoIterator<Item = Expression>) -> Self {
        Self::collect(Connective::And, expressions)
    }

    /// Build an OR node from expressions.
    pub fn any(expressions: impl IntoIterator<Item = Expression>) -> Self {
        Self::collect(Connective::Or, expressions)
    }

    fn collect(connective: Connective, expressions: impl IntoIterator<Item = Expression>) -> Self {
        let mut node = Self::with_connective(connective);
        for expression in expressions {
            node.insert(expression);
        }
        node
    }

    /// The node's connective; AND until one is set.
    pub fn connective(&self) -> Connective {
        self.connective.unwrap_or_default()
    }

    /// The children in insertion order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Check if the node has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Add `field = value` joined with AND.
    pub fn also(&mut self, field: impl Into<Subject>, value: impl Into<Value>) -> QueryResult<&mut Self> {
        self.add(Connective::And, Expression::eq(field, value)?)
    }

    /// Add `field <op> value` joined with AND.
    pub fn also_op(
        &mut self,
        field: impl Into<Subject>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> QueryResult<&mut Self> {
        self.add(Connective::And, Expression::new(field, operator, value)?)
    }

    /// Add `field = value` joined with OR.
    pub fn either(&mut self, field: impl Into<Subject>, value: impl Into<Value>) -> QueryResult<&mut Self> {
        self.add(Connective::Or, Expression::eq(field, value)?)
    }

    /// Add `field <op> value` joined with OR.
    pub fn either_op(
        &mut self,
        field: impl Into<Subject>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> QueryResult<&mut Self> {
        self.add(Connective::Or, Expression::new(field, operator, value)?)
    }

    /// Add `field = value` joined with XOR.
    pub fn maybe(&mut self, field: impl Into<Subject>, value: impl Into<Value>) -> QueryResult<&mut Self> {
        self.add(Connective::Xor, Expression::eq(field, value)?)
    }

    /// Add `field <op> value` joined with XOR.
    pub fn maybe_op(
        &mut self,
        field: impl Into<Subject>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> QueryResult<&mut Self> {
        self.add(Connective::Xor, Expression::new(field, operator, value)?)
    }

    /// Add `field IN (SELECT ...)` joined with AND.
    pub fn also_in(&mut self, field: impl Into<Subject>, query: Query) -> QueryResult<&mut Self> {
        self.add(Connective::And, Expression::sub_query(field, Operator::In, query)?)
    }

    /// Add a prepared expression with the given connective.
    ///
    /// Fails with a mixed-connective error if the node already uses a
    /// different connective.
    pub fn add(&mut self, connective: Connective, expression: Expression) -> QueryResult<&mut Self> {
        self.fix_connective(connective)?;
        self.insert(expression);
        Ok(self)
    }

    /// Open a nested group.
    ///
    /// `build` receives the new child node; the child is appended only if it
    /// ends up non-empty. The parent's connective is not affected.
    pub fn group<F>(&mut self, connective: Connective, build: F) -> QueryResult<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> QueryResult<()>,
    {
        let mut child = Self::with_connective(connective);
        build(&mut child)?;
        self.nest(child);
        Ok(self)
    }

    /// Append a prepared node as a nested group, if it is non-empty.
    pub fn nest(&mut self, child: Predicate) -> &mut Self {
        if !child.is_empty() {
            self.children.push(Node::Group(child));
        }
        self
    }

    fn fix_connective(&mut self, connective: Connective) -> QueryResult<()> {
        match self.connective {
            None => {
                self.connective = Some(connective);
                Ok(())
            }
            Some(fixed) if fixed == connective => Ok(()),
            Some(fixed) => Err(QueryError::mixed_connective(
                &fixed.key().to_uppercase(),
                &connective.key().to_uppercase(),
            )),
        }
    }

    // Identical conditions fold into the first occurrence's slot.
    fn insert(&mut self, expression: Expression) {
        let existing = self
            .children
            .iter_mut()
            .find(|node| matches!(node, Node::Expression(e) if *e == expression));
        match existing {
            Some(slot) => *slot = Node::Expression(expression),
            None => self.children.push(Node::Expression(expression)),
        }
    }

    /// Iterate over every expression in the tree, depth-first, left to right.
    pub fn expressions(&self) -> impl Iterator<Item = &Expression> + '_ {
        let mut stack: Vec<std::slice::Iter<'_, Node>> = vec![self.children.iter()];
        std::iter::from_fn(move || {
            while let Some(top) = stack.last_mut() {
                match top.next() {
                    Some(Node::Expression(e)) => return Some(e),
                    Some(Node::Group(g)) => stack.push(g.children.iter()),
                    None => {
                        stack.pop();
                    }
                }
            }
            None
        })
    }
}
