//! YarnDB CLI
//!
//! Command-line access to a YarnDB data directory.
//!
//! # Commands
//!
//! - `init` - Create the data directory and report what it holds
//! - `set` / `get` / `delete` - Single record operations
//! - `query` - Exact-match query on a field path
//! - `index` - Build an index for this run and look values up in it
//! - `save` - Flush pending changes
//! - `status` - Display datastore status
//! - `apply` - Apply a YAML batch in one transaction
//!
//! Settings come from `yarndb.yaml` in the working directory (or `--config`),
//! with command-line flags taking precedence.

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use settings::{Overrides, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// YarnDB command-line tool.
#[derive(Parser)]
#[command(name = "yarndb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to ./yarndb.yaml when present)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Directory holding the shard files
    #[arg(global = true, short, long)]
    data_dir: Option<PathBuf>,

    /// Background save period in seconds (0 disables it)
    #[arg(global = true, long)]
    auto_save_interval: Option<u64>,

    /// Log level (debug, info, warn, error)
    #[arg(global = true, long)]
    log_level: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and report what it holds
    Init,

    /// Create or replace a record from inline YAML
    Set {
        /// Record id; its prefix before '_' names the shard
        id: String,
        /// YAML document
        yaml: String,
    },

    /// Print a record
    Get {
        /// Record id
        id: String,
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: String,
    },

    /// Find records whose field equals a value
    Query {
        /// Query of the form path=value; the value is parsed as YAML
        query: String,
        /// Build an index on the path before querying
        #[arg(short, long)]
        indexed: bool,
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Build an index on a field path
    Index {
        /// Field path, dot separated
        path: String,
        /// Print the record holding this value
        #[arg(short, long)]
        lookup: Option<String>,
    },

    /// Save pending changes
    Save,

    /// Display datastore status
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Apply a YAML batch of sets and deletes in one transaction
    Apply {
        /// Batch file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = Settings::load(
        cli.config.as_deref(),
        Overrides {
            data_dir: cli.data_dir,
            auto_save_interval: cli.auto_save_interval,
            log_level: cli.log_level,
        },
    )?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => commands::init::run(&settings)?,
        Commands::Set { id, yaml } => commands::record::set(&settings, &id, &yaml)?,
        Commands::Get { id, format } => commands::record::get(&settings, &id, &format)?,
        Commands::Delete { id } => commands::record::delete(&settings, &id)?,
        Commands::Query {
            query,
            indexed,
            format,
        } => commands::query::query(&settings, &query, indexed, &format)?,
        Commands::Index { path, lookup } => {
            commands::query::index(&settings, &path, lookup.as_deref())?;
        }
        Commands::Save => commands::save::run(&settings)?,
        Commands::Status { format } => commands::status::run(&settings, &format)?,
        Commands::Apply { file } => commands::apply::run(&settings, &file)?,
        Commands::Version => {
            println!("YarnDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("YarnDB Core v{}", yarndb_core::VERSION);
        }
    }

    Ok(())
}
