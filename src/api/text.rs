//! Purpose: One-call entry points from raw JSON text to typed results.
//! Exports: `decode`, `parse_tx_request_str`, `parse_tx_op_str`, `parse_with_str`,
//! `parse_return_str`.
//! Role: Convenience layer for callers that hold text rather than a parsed tree.
//! Invariants: Decode failures are `txjson/invalid-json`; everything after decode is unchanged.

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::ops::{TxOp, parse_tx_op};
use crate::core::query::{ReturnClause, WithClause, parse_return, parse_with};
use crate::core::request::{TxRequest, parse_tx_request};
use crate::json::parse;

/// Decodes `input` into a JSON tree; `context` names the input in hints.
pub fn decode(input: &str, context: &str) -> Result<Value, Error> {
    parse::from_str::<Value>(input).map_err(|err| {
        let category = parse::categorize_error(&err);
        Error::new(ErrorKind::InvalidJson)
            .with_message("invalid JSON")
            .with_hint(parse::hint_for_error(&err, context))
            .with_context("category", category.as_str())
            .with_source(err)
    })
}

pub fn parse_tx_request_str(input: &str) -> Result<TxRequest, Error> {
    parse_tx_request(&decode(input, "tx request")?)
}

pub fn parse_tx_op_str(input: &str) -> Result<TxOp, Error> {
    parse_tx_op(&decode(input, "tx op")?)
}

pub fn parse_with_str(input: &str) -> Result<WithClause, Error> {
    parse_with(&decode(input, "with clause")?)
}

pub fn parse_return_str(input: &str) -> Result<ReturnClause, Error> {
    parse_return(&decode(input, "return clause")?)
}
