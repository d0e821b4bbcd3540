//! Purpose: Validate a transaction submission envelope and build `TxRequest`.
//! Exports: `TxRequest`, `parse_tx_request`, `TX_OPS_KEY`, `TX_OPTIONS_KEY`.
//! Role: Top-level entry for transaction documents; delegates each op to the dispatcher.
//! Invariants: Checks run envelope, then ops in order, then options; the first failure wins.
//! Invariants: No partially validated request is ever returned.
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::ops::{TxOp, parse_tx_op};
use crate::core::options::TxOptions;

pub const TX_OPS_KEY: &str = "tx_ops";
pub const TX_OPTIONS_KEY: &str = "tx_options";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TxRequest {
    pub ops: Vec<TxOp>,
    pub options: TxOptions,
}

pub fn parse_tx_request(node: &Value) -> Result<TxRequest, Error> {
    let Some(map) = node.as_object() else {
        return Err(Error::new(ErrorKind::MalformedTx)
            .with_message("transaction must be a JSON object")
            .with_json(node));
    };
    let Some(raw_ops) = map.get(TX_OPS_KEY) else {
        return Err(Error::new(ErrorKind::MissingTxOps)
            .with_message("missing `tx_ops`")
            .with_json(node));
    };
    let Some(raw_ops) = raw_ops.as_array() else {
        return Err(Error::new(ErrorKind::MalformedTxOps)
            .with_message("`tx_ops` must be a list of operations")
            .with_json(node));
    };

    let ops = raw_ops
        .iter()
        .enumerate()
        .map(|(index, op)| parse_tx_op(op).map_err(|err| err.with_context("op_index", index)))
        .collect::<Result<Vec<_>, _>>()?;

    let options = match map.get(TX_OPTIONS_KEY) {
        None | Some(Value::Null) => TxOptions::default(),
        Some(raw) => TxOptions::from_json(raw)?,
    };

    tracing::debug!(ops = ops.len(), "parsed tx request");
    Ok(TxRequest { ops, options })
}
