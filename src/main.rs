//! Purpose: `txjson` CLI entry point: check transaction and query documents from the shell.
//! Role: Binary crate root; parses args, reads input, runs the parsers, emits JSON on stdout.
//! Invariants: Successful parses print the typed result as JSON on stdout.
//! Invariants: Non-interactive errors are emitted as one JSON line on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Input size is capped here, before any document reaches the parsers.
#![allow(clippy::result_large_err)]
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, IsTerminal, Read};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod ast_json;
mod command_dispatch;

use txjson::api::{Error, ErrorKind, JSON_CONTEXT_KEY, to_exit_code};

const DEFAULT_MAX_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command, cli.max_bytes)
        .map_err(add_rejection_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let replacement = arg.to_str().and_then(|value| match value {
                "---help" => Some("--help"),
                "---version" => Some("--version"),
                _ => None,
            });
            replacement.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "txjson",
    version,
    about = "Validate JSON transaction submissions and query clauses",
    help_template = r#"{about-with-newline}
USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    after_help = r#"EXAMPLES
  $ txjson tx '{"tx_ops": [{"put": "docs", "doc": {"xt/id": 1}}]}'
  $ txjson op '{"erase": "docs", "id": 1}'
  $ txjson with '{"with": ["a", {"b": {"+": ["a", 1]}}]}'
  $ txjson tx -f submission.json
  $ cat clause.json | txjson return

NOTES
  - Input: inline JSON, -f FILE, or stdin when neither is given
  - Exit codes: 0 ok, 2 usage, 3 i/o, 4 invalid JSON, 5 rejected document
  - Set RUST_LOG=debug to trace parser decisions on stderr"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_BYTES,
        help = "Reject inputs larger than this many bytes"
    )]
    max_bytes: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Parse a transaction submission ({\"tx_ops\": [...], \"tx_options\"?: {...}})",
        after_help = r#"EXAMPLES
  $ txjson tx '{"tx_ops": [{"put": "docs", "doc": {"xt/id": 1}}]}'
  $ txjson tx '{"tx_ops": [{"delete": "docs", "id": 1}], "tx_options": {"default_tz": "UTC"}}'"#
    )]
    Tx(InputArgs),
    #[command(
        about = "Parse a single operation object (put|delete|erase|call|sql)",
        after_help = r#"EXAMPLES
  $ txjson op '{"put": "docs", "doc": {"xt/id": 1}, "valid_from": "2024-01-01T00:00:00Z"}'
  $ txjson op '{"sql": "INSERT INTO docs RECORDS ?", "arg_rows": [[{"xt$id": 1}]]}'"#
    )]
    Op(InputArgs),
    #[command(
        about = "Parse a with clause ({\"with\": [...]})",
        after_help = r#"EXAMPLES
  $ txjson with '{"with": ["a", {"b": {"+": ["a", 1]}}]}'"#
    )]
    With(InputArgs),
    #[command(
        about = "Parse a return clause ({\"return\": [...]})",
        after_help = r#"EXAMPLES
  $ txjson return '{"return": ["name", {"total": {"sum": ["amount"]}}]}'"#
    )]
    Return(InputArgs),
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(about = "Print version info")]
    Version,
}

#[derive(Args)]
struct InputArgs {
    #[arg(help = "Inline JSON document")]
    data: Option<String>,
    #[arg(
        short = 'f',
        long = "file",
        help = "Read the document from a file (use - for stdin)",
        conflicts_with = "data"
    )]
    file: Option<String>,
}

/// Reads the document named by `args`, capped at `max_bytes`. Returns (text, label).
fn read_input(args: &InputArgs, max_bytes: u64) -> Result<(String, String), Error> {
    if let Some(data) = &args.data {
        check_size(data.len() as u64, max_bytes)?;
        return Ok((data.clone(), "inline".to_string()));
    }
    match args.file.as_deref() {
        None if io::stdin().is_terminal() => Err(missing_data_error()),
        None | Some("-") => read_capped(io::stdin().lock(), max_bytes, "stdin"),
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message(format!("failed to open {path}"))
                    .with_context("path", path)
                    .with_source(err)
            })?;
            read_capped(file, max_bytes, path)
        }
    }
}

fn missing_data_error() -> Error {
    Error::new(ErrorKind::Usage)
        .with_message("missing data input")
        .with_hint("Provide JSON via DATA, --file, or pipe JSON to stdin.")
}

fn read_capped<R: Read>(reader: R, max_bytes: u64, label: &str) -> Result<(String, String), Error> {
    let mut bytes = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read {label}"))
                .with_source(err)
        })?;
    check_size(bytes.len() as u64, max_bytes)?;
    let text = String::from_utf8(bytes).map_err(|err| {
        Error::new(ErrorKind::InvalidJson)
            .with_message(format!("{label} is not valid UTF-8"))
            .with_hint("JSON input must be UTF-8 encoded.")
            .with_context("category", "syntax")
            .with_source(err)
    })?;
    Ok((text, label.to_string()))
}

fn check_size(len: u64, max_bytes: u64) -> Result<(), Error> {
    if len > max_bytes {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("input exceeds {max_bytes} bytes"))
            .with_hint("Split the submission or raise --max-bytes."));
    }
    Ok(())
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("txjson {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(json!({
            "name": "txjson",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }
}

fn add_rejection_hint(err: Error) -> Error {
    if !err.kind().is_rejection() || err.hint().is_some() {
        return err;
    }
    err.with_hint("The document was rejected as-is. Fix the part shown under `json` and resubmit.")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check the path and permissions, or pipe the document on stdin.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share the input if it persists.",
    )
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"txjson/internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::InvalidJson => "invalid JSON".to_string(),
        _ => "document rejected".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(err.kind().code()));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if !err.context().is_empty() {
        let context = err
            .context()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<Map<_, _>>();
        inner.insert("context".to_string(), Value::Object(context));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}: {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        err.kind().code(),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    for (key, value) in err.context() {
        if key == JSON_CONTEXT_KEY {
            continue;
        }
        let rendered = value
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string());
        lines.push(format!(
            "{} {rendered}",
            colorize_label(&format!("{key}:"), use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(json) = err.json() {
        lines.push(colorize_label("json:", use_color, AnsiColor::Yellow));
        lines.extend(json.lines().map(|line| format!("  {line}")));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, use_color: bool, color: AnsiColor) -> String {
    if !use_color {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\x1b[1;{code}m{label}\x1b[0m")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let subcommand = usage.and_then(|usage| {
        let mut tokens = usage.split_whitespace().skip_while(|token| *token != "txjson");
        tokens.next()?;
        tokens.next().filter(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
    });

    match subcommand {
        Some(subcommand) => format!("Try `txjson {subcommand} --help`."),
        None => "Try `txjson --help`.".to_string(),
    }
}
