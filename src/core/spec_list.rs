//! Purpose: Parse arrays of bare-or-keyed binding elements into ordered specs.
//! Exports: `parse_spec_list`, `SpecListError`.
//! Role: Shared decision tree behind every binding-list clause (`with`, `return`, ...).
//! Invariants: Output order equals input order; nothing is reordered or deduplicated.
//! Invariants: The caller's constructor decides what a bare string means.
//! Notes: Constructor failures are kept apart from parse failures so callers can wrap
//! the former exactly once and pass the latter through untouched.
use std::fmt;

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::expr::{Expr, parse_expr};

#[derive(Debug)]
pub enum SpecListError<E> {
    /// Typed failure from shape or expression parsing.
    Parse(Error),
    /// Failure raised by the caller-supplied constructor.
    Make(E),
}

impl<E> From<Error> for SpecListError<E> {
    fn from(err: Error) -> Self {
        Self::Parse(err)
    }
}

impl<E: fmt::Display> fmt::Display for SpecListError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Make(err) => write!(f, "{err}"),
        }
    }
}

/// Builds one spec per element of `items` via `make(name, expr)`.
///
/// A bare string element yields `make(name, None)`; a single-key object yields
/// `make(key, Some(expr))`. Every other shape is `query/malformed-spec`.
pub fn parse_spec_list<T, E, F>(items: &[Value], mut make: F) -> Result<Vec<T>, SpecListError<E>>
where
    F: FnMut(String, Option<Expr>) -> Result<T, E>,
{
    let mut specs = Vec::with_capacity(items.len());
    for item in items {
        let (name, expr) = match item {
            Value::String(name) => (name.clone(), None),
            Value::Object(map) if map.len() == 1 => {
                let Some((name, value)) = map.iter().next() else {
                    return Err(malformed_spec(item).into());
                };
                (name.clone(), Some(parse_expr(value)?))
            }
            _ => return Err(malformed_spec(item).into()),
        };
        specs.push(make(name, expr).map_err(SpecListError::Make)?);
    }
    Ok(specs)
}

fn malformed_spec(item: &Value) -> Error {
    Error::new(ErrorKind::MalformedSpec)
        .with_message("binding must be a name or an object with exactly one key")
        .with_json(item)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::{SpecListError, parse_spec_list};
    use crate::core::error::ErrorKind;
    use crate::core::expr::Expr;
    use serde_json::{Value, json};

    fn pairs(items: &Value) -> Result<Vec<(String, Option<Expr>)>, SpecListError<Infallible>> {
        parse_spec_list(items.as_array().unwrap(), |name, expr| Ok((name, expr)))
    }

    #[test]
    fn bare_and_keyed_elements_keep_order() {
        let specs = pairs(&json!(["b", {"a": 1}, "c"])).unwrap();
        assert_eq!(
            specs,
            vec![
                ("b".to_string(), None),
                ("a".to_string(), Some(Expr::Int(1))),
                ("c".to_string(), None),
            ]
        );
    }

    #[test]
    fn duplicates_are_kept() {
        let specs = pairs(&json!(["x", "x"])).unwrap();
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn bare_string_meaning_belongs_to_caller() {
        let items = json!(["x"]);
        let specs: Vec<Expr> = parse_spec_list::<_, Infallible, _>(
            items.as_array().unwrap(),
            |_, expr| Ok(expr.unwrap_or(Expr::Null)),
        )
        .unwrap();
        assert_eq!(specs, vec![Expr::Null]);
    }

    #[test]
    fn bad_shapes_are_malformed_spec() {
        for bad in [json!({}), json!({"x": 1, "y": 2}), json!(3), json!(null), json!(["x"])] {
            let items = Value::Array(vec![bad.clone()]);
            match pairs(&items) {
                Err(SpecListError::Parse(err)) => {
                    assert_eq!(err.kind(), ErrorKind::MalformedSpec, "input: {bad}");
                    assert_eq!(
                        err.json(),
                        Some(serde_json::to_string_pretty(&bad).unwrap().as_str())
                    );
                }
                other => panic!("unexpected result for {bad}: {other:?}"),
            }
        }
    }

    #[test]
    fn expression_errors_pass_through() {
        match pairs(&json!([{"x": {}}])) {
            Err(SpecListError::Parse(err)) => assert_eq!(err.kind(), ErrorKind::MalformedExpr),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn constructor_failures_are_reported_separately() {
        let items = json!(["ok", "bad"]);
        let result: Result<Vec<String>, _> =
            parse_spec_list(items.as_array().unwrap(), |name, _| {
                if name == "bad" { Err(name) } else { Ok(name) }
            });
        match result {
            Err(SpecListError::Make(name)) => assert_eq!(name, "bad"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
