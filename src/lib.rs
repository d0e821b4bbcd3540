//! Purpose: Typed parsing of JSON transaction submissions and query binding clauses.
//! Exports: `api` (stable surface), `core` (parsers, models, error model).
//! Role: Library backing the `txjson` CLI and any server that accepts these documents.
//! Invariants: Parsers never execute operations or evaluate expressions.
//! Invariants: Each call is fail-fast and returns a fully validated value or one structured error.
pub mod api;
pub mod core;
mod json;
