//! annolog CLI: one command per invocation, JSON on stdout.
//!
//! Errors are written to stderr as `{code, message}`. Exit status is 1 for
//! any failure and 2 for an ambiguous merge that needs operator review.
//! Invocations against one data directory take turns: each waits up to
//! `--lock-wait-ms` for the previous one to release it.
//! Set `ANNOLOG_LOG` (e.g. `ANNOLOG_LOG=debug`) to see engine logs.

mod commands;
mod format;
mod parse;

use std::path::Path;
use std::process;
use std::time::Duration;

use annolog::{Annolog, EngineConfig, Error};
use annolog_wire::{decode_column, encode_entries};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{exit_code, format_error, format_migration, format_reconciled, format_repair};
use parse::{lock_wait_ms, matches_to_action, CliAction};

fn main() {
    init_logging();

    let matches = build_cli().get_matches();

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("{}", json!({"code": "UsageError", "message": msg}));
            process::exit(1);
        }
    };

    let result = if action.needs_database() {
        open_database(&matches).and_then(|db| {
            let output = execute(&db, action)?;
            db.close()?;
            Ok(output)
        })
    } else {
        execute_offline(action)
    };

    match result {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{}", format_error(&Error::from(e)));
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("{}", format_error(&e));
            process::exit(exit_code(&e));
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("ANNOLOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(matches: &clap::ArgMatches) -> Result<Annolog, Error> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let builder = Annolog::builder()
        .config(config)
        .lock_wait(Duration::from_millis(lock_wait_ms(matches)?));

    if matches.get_flag("ephemeral") {
        return builder.open_temp();
    }
    let dir = matches
        .get_one::<String>("data-dir")
        .map(String::as_str)
        .unwrap_or(".annolog");
    builder.path(dir).open()
}

fn read_snapshot(path: &Path) -> Result<Value, Error> {
    let text = std::fs::read_to_string(path)?;
    Ok(decode_column(Some(&text)))
}

fn execute(db: &Annolog, action: CliAction) -> Result<Value, Error> {
    match action {
        CliAction::Append {
            parent,
            author,
            content,
        } => {
            let result = db.append_annotation(parent, author.as_deref(), &content)?;
            Ok(serde_json::to_value(result)?)
        }
        CliAction::History { parent, full } => {
            if full {
                Ok(encode_entries(&db.history(parent)))
            } else {
                Ok(serde_json::to_value(db.get_annotations(parent))?)
            }
        }
        CliAction::Count { parent } => Ok(json!({
            "parent": parent,
            "count": db.count(parent),
            "version": db.version(parent),
        })),
        CliAction::Parents => Ok(serde_json::to_value(db.parents())?),
        CliAction::Import { parent, file } => {
            let text = std::fs::read_to_string(&file)?;
            let imported = db.import_legacy(parent, &text)?;
            Ok(json!({ "parent": parent, "imported": imported }))
        }
        CliAction::Migrate { parent } => Ok(format_migration(&db.migrate(parent)?)),
        CliAction::Export { parent } => Ok(db.export_snapshot(parent)),
        CliAction::Repair { parent, backup } => {
            let backup = read_snapshot(&backup)?;
            Ok(format_repair(&db.repair_log(parent, &backup)?))
        }
        CliAction::Info => {
            let metrics = db.metrics();
            let stats = db.recovery_stats();
            Ok(json!({
                "path": db.path().map(|p| p.display().to_string()),
                "durability": db.durability_mode(),
                "records": metrics.records,
                "commits": metrics.commits,
                "recovery": stats.summary(),
                "recoveryHasIssues": stats.has_issues(),
            }))
        }
        CliAction::Reconcile { .. } => execute_offline(action),
    }
}

fn execute_offline(action: CliAction) -> Result<Value, Error> {
    match action {
        CliAction::Reconcile { a, b } => {
            let a = read_snapshot(&a)?;
            let b = read_snapshot(&b)?;
            Ok(format_reconciled(&Annolog::reconcile(&a, &b)?))
        }
        other => Err(Error::Validation(format!(
            "{:?} needs an open database",
            other
        ))),
    }
}
