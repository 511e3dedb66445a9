//! Purpose: `jsondb` CLI entry point.
//! Role: Binary crate root; parses args, resolves config, runs one command, emits JSON on stdout.
//! Invariants: Success payloads are JSON on stdout (pretty when stdout is a terminal).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All storage access goes through `api::JsonDb` (locking + atomic writes).
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod output_json;

use jsondb::api::{Config, DEFAULT_PRIMARY_KEY, Error, ErrorKind, JsonDb, Record, to_exit_code};

const DEFAULT_DB_PATH: &str = ".";
const DEFAULT_DB_NAME: &str = "database.json";

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
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
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
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `jsondb --help` for usage."));
            }
        },
    };

    let config = resolve_config(&cli)?;
    let db = JsonDb::new(config)?;
    command_dispatch::dispatch_command(cli.command, &db)
}

#[derive(Parser)]
#[command(
    name = "jsondb",
    version,
    about = "Embedded record store keeping tables in one JSON file",
    long_about = None,
    after_help = r#"EXAMPLES
  $ jsondb --db-path ./data create users '{"name": "Al"}'
  $ jsondb --db-path ./data get users --where age '>' 30
  $ jsondb --db-path ./data paginate users --size 10 --page 2

Set RUST_LOG=debug to trace document reads and writes on stderr."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        help = "JSON config file with `db_path` and `db_name`",
        value_hint = ValueHint::FilePath
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        help = "Directory holding the database file (default: .)",
        value_hint = ValueHint::DirPath
    )]
    db_path: Option<String>,
    #[arg(long, help = "Database file name (default: database.json)")]
    db_name: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct TableArgs {
    #[arg(help = "Table name")]
    table: String,
    #[arg(long, default_value = DEFAULT_PRIMARY_KEY, help = "Primary-key field name")]
    primary_key: String,
}

#[derive(Args, Debug)]
struct WhereArgs {
    #[arg(
        long = "where",
        num_args = 3,
        value_names = ["COLUMN", "OP", "VALUE"],
        action = ArgAction::Append,
        allow_hyphen_values = true,
        help = "Filter condition; repeat to narrow further (operators: = > < >= <= != <>)"
    )]
    conditions: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Print every table in the document.
    All,
    /// Print the records of a table, optionally filtered.
    Get {
        #[command(flatten)]
        table: TableArgs,
        #[command(flatten)]
        filter: WhereArgs,
    },
    /// Insert a record; the primary key is assigned when omitted.
    Create {
        #[command(flatten)]
        table: TableArgs,
        #[arg(help = "Record as a JSON object")]
        data: String,
    },
    /// Merge fields into the record with the given id.
    Update {
        #[command(flatten)]
        table: TableArgs,
        id: String,
        #[arg(help = "Fields to merge as a JSON object")]
        data: String,
    },
    /// Print the record with the given id, or null.
    Find {
        #[command(flatten)]
        table: TableArgs,
        id: String,
    },
    /// Remove the record with the given id.
    Delete {
        #[command(flatten)]
        table: TableArgs,
        id: String,
    },
    /// Print the first record.
    First {
        #[command(flatten)]
        table: TableArgs,
        #[command(flatten)]
        filter: WhereArgs,
    },
    /// Print the last record, or null.
    Last {
        #[command(flatten)]
        table: TableArgs,
        #[command(flatten)]
        filter: WhereArgs,
    },
    /// Count records.
    Count {
        #[command(flatten)]
        table: TableArgs,
        #[command(flatten)]
        filter: WhereArgs,
    },
    /// Count records whose column equals a value.
    CountOf {
        #[command(flatten)]
        table: TableArgs,
        column: String,
        value: String,
        #[command(flatten)]
        filter: WhereArgs,
    },
    /// Print one page of records.
    Paginate {
        #[command(flatten)]
        table: TableArgs,
        #[arg(long, help = "Records per page")]
        size: usize,
        #[arg(long, default_value_t = 1, help = "Page number, starting at 1")]
        page: usize,
        #[command(flatten)]
        filter: WhereArgs,
    },
    /// Print the primary key of the last record (0 when empty).
    LastId {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Truncate the database file, destroying every table.
    Clean,
}

fn resolve_config(cli: &Cli) -> Result<Config, Error> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::new(DEFAULT_DB_PATH, DEFAULT_DB_NAME),
    };
    if let Some(db_path) = &cli.db_path {
        config.db_path = db_path.clone();
    }
    if let Some(db_name) = &cli.db_name {
        config.db_name = db_name.clone();
    }
    Ok(config)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// JSON when valid, otherwise the raw text as a string (`30` is a number, `Al` a string).
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_record(raw: &str) -> Result<Record, Error> {
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("record data is not valid JSON")
            .with_hint(r#"Pass a JSON object, e.g. '{"name": "Al"}'."#)
            .with_source(err)
    })?;
    match value {
        Value::Object(record) => Ok(record),
        other => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("record data must be a JSON object, got {other}"))
            .with_hint(r#"Pass a JSON object, e.g. '{"name": "Al"}'."#)),
    }
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

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
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
        ErrorKind::UnsupportedOperation => "unsupported operation".to_string(),
        ErrorKind::DuplicatedId => "duplicated id".to_string(),
        ErrorKind::Corrupt => "corrupt document".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::OutOfRange => "out of range".to_string(),
        ErrorKind::UnknownTable => "unknown table".to_string(),
        ErrorKind::Busy => "database is busy".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
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
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(table) = err.table() {
        inner.insert("table".to_string(), json!(table));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(table) = err.table() {
        lines.push(format!("table: {table}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
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
