//! stenodict CLI
//!
//! Command-line interface for inspecting and converting steno dictionaries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stenodict_core::Config;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "stenodict")]
#[command(about = "Inspect and convert SQLite and JSON steno dictionaries")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log more (-v debug, -vv trace); STENODICT_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Open dictionaries read-only
    #[arg(long, global = true)]
    readonly: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the translation of an outline
    Lookup {
        /// Dictionary file (.json or .db)
        dictionary: PathBuf,
        /// Outline, strokes separated by `/`
        outline: String,
    },
    /// Find the outlines that produce a translation
    Reverse {
        /// Dictionary file (.json or .db)
        dictionary: PathBuf,
        /// Exact translation text
        translation: String,
        /// List stored translations matching regardless of case instead
        #[arg(short = 'i', long)]
        ignore_case: bool,
    },
    /// Add or replace an entry
    Set {
        /// Dictionary file (.json or .db), created if missing
        dictionary: PathBuf,
        /// Outline, strokes separated by `/`
        outline: String,
        /// Translation text
        translation: String,
    },
    /// Delete an entry
    #[command(alias = "rm")]
    Delete {
        /// Dictionary file (.json or .db)
        dictionary: PathBuf,
        /// Outline, strokes separated by `/`
        outline: String,
    },
    /// List entries
    #[command(alias = "ls")]
    List {
        /// Dictionary file (.json or .db)
        dictionary: PathBuf,
        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show entry count and longest key
    Stats {
        /// Dictionary file (.json or .db)
        dictionary: PathBuf,
    },
    /// Convert between JSON snapshots and SQLite files
    Convert {
        /// Source dictionary
        from: PathBuf,
        /// Destination; its extension picks the format
        to: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let mut config = Config::load().context("Failed to load configuration")?;
    if cli.readonly {
        config.readonly = true;
    }

    match cli.command {
        Commands::Lookup {
            dictionary,
            outline,
        } => commands::entry::lookup(&dictionary, &outline, &config, &output),
        Commands::Reverse {
            dictionary,
            translation,
            ignore_case,
        } => commands::entry::reverse(&dictionary, &translation, ignore_case, &config, &output),
        Commands::Set {
            dictionary,
            outline,
            translation,
        } => commands::entry::set(&dictionary, &outline, &translation, &config, &output),
        Commands::Delete {
            dictionary,
            outline,
        } => commands::entry::delete(&dictionary, &outline, &config, &output),
        Commands::List { dictionary, limit } => {
            commands::entry::list(&dictionary, limit, &config, &output)
        }
        Commands::Stats { dictionary } => commands::stats::show(&dictionary, &config, &output),
        Commands::Convert { from, to } => commands::convert::convert(&from, &to, &config, &output),
    }
}

/// Log to stderr so stdout stays clean for --json and --quiet
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_env("STENODICT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!("stenodict_core={},stenodict={}", level, level))
    });

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
