//! Argument parsing: `ArgMatches` → `CliAction`.

use std::path::PathBuf;

use annolog::ParentId;
use clap::ArgMatches;

/// What the CLI should do after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Append one note
    Append {
        parent: ParentId,
        author: Option<String>,
        content: String,
    },
    /// Print a record's history
    History { parent: ParentId, full: bool },
    /// Print count and version
    Count { parent: ParentId },
    /// List records
    Parents,
    /// Seed a legacy column from a file
    Import { parent: ParentId, file: PathBuf },
    /// Migrate a legacy column
    Migrate { parent: ParentId },
    /// Print a backup snapshot
    Export { parent: ParentId },
    /// Repair from a backup file
    Repair { parent: ParentId, backup: PathBuf },
    /// Offline merge of two files
    Reconcile { a: PathBuf, b: PathBuf },
    /// Engine metrics
    Info,
}

impl CliAction {
    /// Whether the action needs an open database.
    pub fn needs_database(&self) -> bool {
        !matches!(self, CliAction::Reconcile { .. })
    }
}

/// Convert top-level matches into an action.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (cmd, m) = matches.subcommand().ok_or("No command given")?;
    match cmd {
        "append" => Ok(CliAction::Append {
            parent: parent(m)?,
            author: m.get_one::<String>("author").cloned(),
            content: required(m, "content")?.clone(),
        }),
        "history" => Ok(CliAction::History {
            parent: parent(m)?,
            full: m.get_flag("full"),
        }),
        "count" => Ok(CliAction::Count { parent: parent(m)? }),
        "parents" => Ok(CliAction::Parents),
        "import" => Ok(CliAction::Import {
            parent: parent(m)?,
            file: PathBuf::from(required(m, "file")?),
        }),
        "migrate" => Ok(CliAction::Migrate { parent: parent(m)? }),
        "export" => Ok(CliAction::Export { parent: parent(m)? }),
        "repair" => Ok(CliAction::Repair {
            parent: parent(m)?,
            backup: PathBuf::from(required(m, "backup")?),
        }),
        "reconcile" => Ok(CliAction::Reconcile {
            a: PathBuf::from(required(m, "a")?),
            b: PathBuf::from(required(m, "b")?),
        }),
        "info" => Ok(CliAction::Info),
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Milliseconds to wait for the data directory lock.
pub fn lock_wait_ms(matches: &ArgMatches) -> Result<u64, annolog::Error> {
    match matches.get_one::<String>("lock-wait-ms") {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            annolog::Error::Config(format!("Invalid --lock-wait-ms '{}': {}", raw, e))
        }),
        None => Ok(0),
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a String, String> {
    m.get_one::<String>(name)
        .ok_or_else(|| format!("Missing argument: {}", name))
}

fn parent(m: &ArgMatches) -> Result<ParentId, String> {
    let raw = required(m, "parent")?;
    raw.trim()
        .parse::<ParentId>()
        .map_err(|e| format!("Invalid parent id '{}': {}", raw, e))
}
