//! Purpose: Structured failure type shared by every parser in the crate.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`, `JSON_CONTEXT_KEY`.
//! Role: One error value per failed parse; built at the first violation and propagated.
//! Invariants: `kind` codes are stable and namespaced; they are part of the client contract.
//! Invariants: Parse errors carry the pretty-printed offending subtree under `JSON_CONTEXT_KEY`.
//! Invariants: Foreign failures are attached once via `with_source`, never re-wrapped.
use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;

use crate::core::ops::OpTag;

/// Context key holding the pretty-printed JSON subtree that triggered a failure.
pub const JSON_CONTEXT_KEY: &str = "json";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Io,
    InvalidJson,
    MalformedTx,
    MissingTxOps,
    MalformedTxOps,
    MalformedTxOptions,
    MalformedOp,
    MalformedOpPayload(OpTag),
    MalformedWith,
    MalformedReturn,
    MalformedSpec,
    MalformedExpr,
}

impl ErrorKind {
    /// Stable, namespaced identifier, e.g. `tx/missing-tx-ops`.
    pub fn code(self) -> String {
        match self {
            Self::Internal => "txjson/internal".to_string(),
            Self::Usage => "txjson/usage".to_string(),
            Self::Io => "txjson/io".to_string(),
            Self::InvalidJson => "txjson/invalid-json".to_string(),
            Self::MalformedTx => "tx/malformed-tx".to_string(),
            Self::MissingTxOps => "tx/missing-tx-ops".to_string(),
            Self::MalformedTxOps => "tx/malformed-tx-ops".to_string(),
            Self::MalformedTxOptions => "tx/malformed-tx-options".to_string(),
            Self::MalformedOp => "tx/malformed-op".to_string(),
            Self::MalformedOpPayload(tag) => format!("tx/malformed-op-{}", tag.as_str()),
            Self::MalformedWith => "query/malformed-with".to_string(),
            Self::MalformedReturn => "query/malformed-return".to_string(),
            Self::MalformedSpec => "query/malformed-spec".to_string(),
            Self::MalformedExpr => "query/malformed-expr".to_string(),
        }
    }

    /// True for kinds describing a rejected document rather than a tool failure.
    pub fn is_rejection(self) -> bool {
        !matches!(
            self,
            Self::Internal | Self::Usage | Self::Io | Self::InvalidJson
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    context: Vec<(String, Value)>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Context entries in insertion order.
    pub fn context(&self) -> &[(String, Value)] {
        &self.context
    }

    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Pretty-printed offending JSON, when recorded.
    pub fn json(&self) -> Option<&str> {
        self.context_value(JSON_CONTEXT_KEY)
            .and_then(|value| value.as_str())
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Sets `key`, replacing an earlier entry with the same key in place.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.context.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.context.push((key, value)),
        }
        self
    }

    pub fn with_json(self, node: &Value) -> Self {
        self.with_context(JSON_CONTEXT_KEY, pretty(node))
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Human-readable rendering used for the `json` context entry.
pub fn pretty(node: &Value) -> String {
    serde_json::to_string_pretty(node).unwrap_or_else(|_| node.to_string())
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        for (key, value) in &self.context {
            if key == JSON_CONTEXT_KEY {
                continue;
            }
            write!(f, " ({key}: {value})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Io => 3,
        ErrorKind::InvalidJson => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::{Error, ErrorKind, JSON_CONTEXT_KEY, to_exit_code};
    use crate::core::ops::OpTag;
    use serde_json::json;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Io, 3),
            (ErrorKind::InvalidJson, 4),
            (ErrorKind::MalformedTx, 5),
            (ErrorKind::MalformedOpPayload(OpTag::Put), 5),
            (ErrorKind::MalformedSpec, 5),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn kind_codes_are_namespaced() {
        assert_eq!(ErrorKind::MissingTxOps.code(), "tx/missing-tx-ops");
        assert_eq!(
            ErrorKind::MalformedOpPayload(OpTag::Delete).code(),
            "tx/malformed-op-delete"
        );
        assert_eq!(ErrorKind::MalformedWith.to_string(), "query/malformed-with");
        assert!(ErrorKind::MalformedExpr.is_rejection());
        assert!(!ErrorKind::Io.is_rejection());
    }

    #[test]
    fn context_keeps_insertion_order_and_replaces_in_place() {
        let err = Error::new(ErrorKind::MalformedTxOps)
            .with_json(&json!({"tx_ops": 1}))
            .with_context("op_index", 3)
            .with_context(JSON_CONTEXT_KEY, "replaced");

        let keys: Vec<&str> = err.context().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec![JSON_CONTEXT_KEY, "op_index"]);
        assert_eq!(err.json(), Some("replaced"));
        assert_eq!(err.context_value("op_index"), Some(&json!(3)));
    }

    #[test]
    fn source_is_exposed_through_std_error() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::new(ErrorKind::MalformedTxOptions).with_source(cause);
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("tx/malformed-tx-options"));
    }
}
