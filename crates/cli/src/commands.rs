//! Command tree for the `annolog` binary (clap builder API).

use clap::{Arg, ArgAction, Command};

fn parent_arg() -> Arg {
    Arg::new("parent")
        .required(true)
        .help("Numeric id of the parent record")
}

/// Build the top-level command with every subcommand attached.
pub fn build_cli() -> Command {
    Command::new("annolog")
        .about("Append-only annotation logs for shared business records")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .short('d')
                .global(true)
                .default_value(".annolog")
                .help("Database directory"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML engine configuration file"),
        )
        .arg(
            Arg::new("lock-wait-ms")
                .long("lock-wait-ms")
                .global(true)
                .default_value("5000")
                .help("How long to wait for another annolog process to release the data directory"),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Use a throwaway temp directory instead of --data-dir"),
        )
        .subcommand(
            Command::new("append")
                .about("Append a note to a record")
                .arg(parent_arg())
                .arg(Arg::new("content").required(true).help("Note text"))
                .arg(
                    Arg::new("author")
                        .long("author")
                        .short('a')
                        .help("Author name (defaults to the configured author)"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Print a record's notes, oldest first")
                .arg(parent_arg())
                .arg(
                    Arg::new("full")
                        .long("full")
                        .action(ArgAction::SetTrue)
                        .help("Include entry ids and origins"),
                ),
        )
        .subcommand(
            Command::new("count")
                .about("Print a record's note count and version")
                .arg(parent_arg()),
        )
        .subcommand(Command::new("parents").about("List records holding notes or legacy data"))
        .subcommand(
            Command::new("import")
                .about("Attach a legacy feedback column to a record")
                .arg(parent_arg())
                .arg(Arg::new("file").required(true).help("File holding the column text")),
        )
        .subcommand(
            Command::new("migrate")
                .about("Move a record's legacy column into its canonical log")
                .arg(parent_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Print a record's history as a canonical backup snapshot")
                .arg(parent_arg()),
        )
        .subcommand(
            Command::new("repair")
                .about("Append every backup entry the record is missing")
                .arg(parent_arg())
                .arg(Arg::new("backup").required(true).help("Backup snapshot file")),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Merge two snapshot files offline")
                .arg(Arg::new("a").required(true).help("First snapshot file"))
                .arg(Arg::new("b").required(true).help("Second snapshot file")),
        )
        .subcommand(Command::new("info").about("Print engine metrics and recovery stats"))
}
