//! Purpose: Hold top-level CLI command dispatch for `txjson`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each document command reads once, parses once, and emits one JSON value.

use super::*;

use txjson::api::{decode, parse_return, parse_tx_op, parse_tx_request, parse_with};

pub(super) fn dispatch_command(command: Command, max_bytes: u64) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "txjson", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Tx(args) => {
            let node = read_document(&args, max_bytes)?;
            let request = parse_tx_request(&node)?;
            emit_json(ast_json::request_json(&request)?);
            Ok(RunOutcome::ok())
        }
        Command::Op(args) => {
            let node = read_document(&args, max_bytes)?;
            let op = parse_tx_op(&node)?;
            emit_json(ast_json::op_json(&op)?);
            Ok(RunOutcome::ok())
        }
        Command::With(args) => {
            let node = read_document(&args, max_bytes)?;
            let clause = parse_with(&node)?;
            emit_json(ast_json::with_json(&clause));
            Ok(RunOutcome::ok())
        }
        Command::Return(args) => {
            let node = read_document(&args, max_bytes)?;
            let clause = parse_return(&node)?;
            emit_json(ast_json::return_json(&clause));
            Ok(RunOutcome::ok())
        }
    }
}

fn read_document(args: &InputArgs, max_bytes: u64) -> Result<Value, Error> {
    let (text, label) = read_input(args, max_bytes)?;
    tracing::debug!(source = %label, bytes = text.len(), "read document");
    decode(&text, &label)
}
