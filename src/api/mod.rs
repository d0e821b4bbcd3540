//! Purpose: Define the stable public Rust API boundary for txjson.
//! Exports: Typed request/clause models, the parsers, and the error model.
//! Role: Public, additive-only surface used by the CLI and embedding servers.
//! Invariants: This module is the only public path to the parsers.
//! Invariants: Every parser is a pure function of its input; no state is shared between calls.

mod text;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind, JSON_CONTEXT_KEY};
pub use crate::core::expr::{Expr, parse_expr};
pub use crate::core::ops::{DocId, OpTag, TableName, TxOp, parse_tx_op};
pub use crate::core::options::TxOptions;
pub use crate::core::query::{
    BindingNameError, ColSpec, ReturnClause, VarSpec, WithClause, parse_return, parse_with,
};
pub use crate::core::request::{TX_OPS_KEY, TX_OPTIONS_KEY, TxRequest, parse_tx_request};
pub use crate::core::spec_list::{SpecListError, parse_spec_list};
pub use text::{decode, parse_return_str, parse_tx_op_str, parse_tx_request_str, parse_with_str};
