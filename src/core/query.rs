//! Purpose: Parse query clauses that introduce named bindings.
//! Exports: `VarSpec`, `ColSpec`, `WithClause`, `ReturnClause`, `BindingNameError`,
//! `parse_with`, `parse_return`.
//! Role: Thin clause-level shape checks over the generic spec-list parser.
//! Invariants: Typed parse errors from the spec list propagate unchanged.
//! Invariants: Constructor failures are wrapped exactly once in the clause's kind.
use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::expr::Expr;
use crate::core::spec_list::{SpecListError, parse_spec_list};

/// Binding names must be non-empty and free of surrounding whitespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BindingNameError {
    name: String,
}

impl fmt::Display for BindingNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid binding name {:?}", self.name)
    }
}

impl StdError for BindingNameError {}

fn check_name(name: String) -> Result<String, BindingNameError> {
    if name.is_empty() || name.trim() != name {
        return Err(BindingNameError { name });
    }
    Ok(name)
}

/// One `with` binding. A bare name binds the variable to itself.
#[derive(Clone, Debug, PartialEq)]
pub struct VarSpec {
    pub name: String,
    pub expr: Expr,
}

impl VarSpec {
    pub fn new(name: String, expr: Option<Expr>) -> Result<Self, BindingNameError> {
        let name = check_name(name)?;
        let expr = expr.unwrap_or_else(|| Expr::var(name.clone()));
        Ok(Self { name, expr })
    }
}

/// One `return` column. A bare name projects the variable of the same name.
#[derive(Clone, Debug, PartialEq)]
pub struct ColSpec {
    pub column: String,
    pub expr: Expr,
}

impl ColSpec {
    pub fn new(column: String, expr: Option<Expr>) -> Result<Self, BindingNameError> {
        let column = check_name(column)?;
        let expr = expr.unwrap_or_else(|| Expr::var(column.clone()));
        Ok(Self { column, expr })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WithClause {
    pub bindings: Vec<VarSpec>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReturnClause {
    pub cols: Vec<ColSpec>,
}

/// Describes one binding-list clause: where it lives and how it fails.
struct Clause {
    field: &'static str,
    kind: ErrorKind,
    message: &'static str,
}

const WITH: Clause = Clause {
    field: "with",
    kind: ErrorKind::MalformedWith,
    message: "With should be a list of bindings",
};

const RETURN: Clause = Clause {
    field: "return",
    kind: ErrorKind::MalformedReturn,
    message: "Return should be a list of columns",
};

impl Clause {
    fn parse<T, F>(&self, node: &Value, make: F) -> Result<Vec<T>, Error>
    where
        F: FnMut(String, Option<Expr>) -> Result<T, BindingNameError>,
    {
        let Some(items) = node.get(self.field).and_then(Value::as_array) else {
            return Err(Error::new(self.kind)
                .with_message(self.message)
                .with_json(node));
        };
        parse_spec_list(items, make).map_err(|err| match err {
            SpecListError::Parse(err) => err,
            SpecListError::Make(cause) => Error::new(self.kind)
                .with_message(cause.to_string())
                .with_json(node)
                .with_source(cause),
        })
    }
}

pub fn parse_with(node: &Value) -> Result<WithClause, Error> {
    let bindings = WITH.parse(node, VarSpec::new)?;
    tracing::debug!(bindings = bindings.len(), "parsed with clause");
    Ok(WithClause { bindings })
}

pub fn parse_return(node: &Value) -> Result<ReturnClause, Error> {
    let cols = RETURN.parse(node, ColSpec::new)?;
    tracing::debug!(cols = cols.len(), "parsed return clause");
    Ok(ReturnClause { cols })
}
