//! Fuzz target for predicate rendering.
//!
//! Builds arbitrary predicate trees, renders them for every built-in
//! dialect and checks that each placeholder has exactly one parameter.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_predicate_render
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quarry_query::{
    Connective, Dialect, Expression, Operator, Predicate, PlaceholderStyle, Query, Renderer,
    TypeRegistry, Value,
};

const MAX_DEPTH: usize = 6;

/// A fuzzable value.
#[derive(Debug, Arbitrary, Clone)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<FuzzValue>),
}

impl From<FuzzValue> for Value {
    fn from(val: FuzzValue) -> Self {
        match val {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(b) => Value::Bool(b),
            FuzzValue::Int(i) => Value::Int(i),
            FuzzValue::Float(f) => Value::Float(f),
            FuzzValue::String(s) => Value::String(s),
            FuzzValue::Bytes(b) => Value::Bytes(b),
            FuzzValue::List(list) => Value::List(list.into_iter().map(Value::from).collect()),
        }
    }
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzConnective {
    And,
    Or,
    Xor,
}

impl From<FuzzConnective> for Connective {
    fn from(c: FuzzConnective) -> Self {
        match c {
            FuzzConnective::And => Connective::And,
            FuzzConnective::Or => Connective::Or,
            FuzzConnective::Xor => Connective::Xor,
        }
    }
}

/// A fuzzable predicate node.
#[derive(Debug, Arbitrary)]
enum FuzzNode {
    Condition { field: u8, operator: u8, value: FuzzValue },
    Group(FuzzConnective, Vec<FuzzNode>),
}

fn operator(n: u8) -> Operator {
    const ALL: [Operator; 16] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::NotIn,
        Operator::Null,
        Operator::NotNull,
        Operator::Between,
        Operator::NotBetween,
        Operator::Like,
        Operator::NotLike,
        Operator::Regexp,
        Operator::NotRegexp,
    ];
    ALL[n as usize % ALL.len()]
}

fn build(predicate: &mut Predicate, connective: Connective, nodes: Vec<FuzzNode>, depth: usize) {
    for node in nodes {
        match node {
            FuzzNode::Condition { field, operator: op, value } => {
                // Shape errors are expected for some inputs; skip those conditions.
                if let Ok(expression) = Expression::new(format!("c{}", field), operator(op), value) {
                    let _ = predicate.add(connective, expression);
                }
            }
            FuzzNode::Group(inner, children) if depth < MAX_DEPTH => {
                let inner = Connective::from(inner);
                let _ = predicate.group(inner, |g| {
                    build(g, inner, children, depth + 1);
                    Ok(())
                });
            }
            FuzzNode::Group(..) => {}
        }
    }
}

fn placeholders(sql: &str, style: PlaceholderStyle, params: usize) -> usize {
    match style {
        PlaceholderStyle::Question => sql.matches('?').count(),
        PlaceholderStyle::Numbered => (1..=params)
            .filter(|i| {
                let marker = format!("${}", i);
                sql.match_indices(&marker).any(|(at, _)| {
                    !sql[at + marker.len()..].starts_with(|c: char| c.is_ascii_digit())
                })
            })
            .count(),
    }
}

fuzz_target!(|input: (FuzzConnective, Vec<FuzzNode>)| {
    let (root, nodes) = input;
    let root = Connective::from(root);
    let mut predicate = Predicate::with_connective(root);
    build(&mut predicate, root, nodes, 0);

    let query = Query::select("t").filter(predicate);
    let types = TypeRegistry::new();

    for dialect in [Dialect::standard(), Dialect::sqlite(), Dialect::mysql(), Dialect::postgres()] {
        let Ok(statement) = Renderer::new(&dialect, &types).render(&query) else {
            continue;
        };
        assert_eq!(
            placeholders(&statement.sql, dialect.placeholder, statement.params.len()),
            statement.params.len(),
            "{}: {}",
            dialect.name,
            statement.sql
        );
        // Floats may be NaN, so compare the text and arity only.
        let again = Renderer::new(&dialect, &types).render(&query).expect("second render");
        assert_eq!(statement.sql, again.sql);
        assert_eq!(statement.params.len(), again.params.len());
    }
});
