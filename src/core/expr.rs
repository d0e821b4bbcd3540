//! Purpose: Minimal JSON expression AST carried by query bindings.
//! Exports: `Expr`, `parse_expr`.
//! Role: Hands bound expressions to the query compiler without evaluating them.
//! Invariants: Parsing is pure and total over `Value`; malformed shapes are `query/malformed-expr`.
//! Invariants: Errors carry the smallest offending subtree, not the enclosing document.
use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};

const LITERAL_KEY: &str = "@value";
const PARAM_PREFIX: char = '$';

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Literal string, written as `{"@value": "..."}`.
    Str(String),
    /// Logic variable reference; bare strings in JSON.
    Var(String),
    /// Query parameter; strings with a `$` prefix.
    Param(String),
    List(Vec<Expr>),
    Call { f: String, args: Vec<Expr> },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }
}

pub fn parse_expr(node: &Value) -> Result<Expr, Error> {
    match node {
        Value::Null => Ok(Expr::Null),
        Value::Bool(b) => Ok(Expr::Bool(*b)),
        Value::Number(_) => number_literal(node),
        Value::String(s) => symbol(s, node),
        Value::Array(items) => items
            .iter()
            .map(parse_expr)
            .collect::<Result<Vec<_>, _>>()
            .map(Expr::List),
        Value::Object(map) => object_expr(map, node),
    }
}

fn number_literal(node: &Value) -> Result<Expr, Error> {
    if let Some(n) = node.as_i64() {
        return Ok(Expr::Int(n));
    }
    match node.as_f64() {
        Some(n) => Ok(Expr::Float(n)),
        // Only reachable when serde_json is built with `arbitrary_precision`.
        None => Err(malformed(node, "number out of range")),
    }
}

fn symbol(text: &str, node: &Value) -> Result<Expr, Error> {
    let (param, name) = match text.strip_prefix(PARAM_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if name.is_empty() {
        return Err(malformed(node, "empty variable name"));
    }
    if param {
        Ok(Expr::Param(name.to_string()))
    } else {
        Ok(Expr::Var(name.to_string()))
    }
}

fn object_expr(map: &Map<String, Value>, node: &Value) -> Result<Expr, Error> {
    let mut entries = map.iter();
    let (key, value) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(malformed(
                node,
                "expression objects must have exactly one key",
            ));
        }
    };

    if key == LITERAL_KEY {
        return match value {
            Value::String(s) => Ok(Expr::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => {
                Err(malformed(node, "@value must wrap a scalar"))
            }
            scalar => parse_expr(scalar),
        };
    }

    let Some(args) = value.as_array() else {
        return Err(malformed(
            node,
            format!("arguments to `{key}` must be a list"),
        ));
    };
    let args = args.iter().map(parse_expr).collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::Call {
        f: key.clone(),
        args,
    })
}

fn malformed(node: &Value, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::MalformedExpr)
        .with_message(message)
        .with_json(node)
}
