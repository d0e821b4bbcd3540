//! Purpose: JSON text decoding boundary shared by the public API and the CLI.
//! Exports: `parse` module with decode and failure-classification helpers.
//! Role: Single seam between raw text and the `serde_json::Value` tree the parsers consume.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
