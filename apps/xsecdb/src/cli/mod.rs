//! # xsecdb CLI Module
//!
//! This module implements the CLI interface for xsecdb.
//!
//! ## Available Commands
//!
//! - `status` - Show catalog status
//! - `init` - Initialize a new database
//! - `import` - Create a draft set from a submission file
//! - `update` - Edit a set from a submission file
//! - `publish` - Publish a draft set
//! - `delete` - Delete a draft set or retract a published one
//! - `history` - Show the version history of a set or item
//! - `export` - Export a resolved set to JSON
//! - `search` - Search published items
//! - `facets` - Show remaining search options

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use xsecdb_core::XsecError;

pub use commands::*;

use crate::config::Config;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// xsecdb - Cross-Section Curation Engine
///
/// Versioned curation of particle-scattering cross-section data:
/// draft, publish, archive, and retract item and set records, with
/// content-addressed deduplication and faceted search.
#[derive(Parser, Debug)]
#[command(name = "xsecdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the catalog database (falls back to xsecdb.toml, then xsecdb.redb)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show catalog status
    Status,

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Create a draft set from a JSON submission file
    Import {
        /// Path to the submission file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Edit a set from a JSON submission file
    Update {
        /// Set key to edit
        #[arg(short, long)]
        set: u64,

        /// Path to the submission file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Publish a draft set and its draft members
    Publish {
        /// Set key to publish
        #[arg(short, long)]
        set: u64,
    },

    /// Delete a draft set, or retract a published one with a message
    Delete {
        /// Set key to delete or retract
        #[arg(short, long)]
        set: u64,

        /// Retract message (required for published sets)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show the version history of a set or an item
    History {
        /// Set key
        #[arg(short, long, conflicts_with = "item")]
        set: Option<u64>,

        /// Item key
        #[arg(short, long)]
        item: Option<u64>,
    },

    /// Export a resolved set to JSON
    Export {
        /// Set key to export
        #[arg(short, long)]
        set: u64,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Search published items
    Search {
        #[command(flatten)]
        template: TemplateArgs,
    },

    /// Show remaining search options per dimension
    Facets {
        #[command(flatten)]
        template: TemplateArgs,
    },
}

/// Search template flags shared by `search` and `facets`.
///
/// State selections are comma-separated serialized summaries; a
/// trailing `!` pins a summary to the named level without its
/// substates.
#[derive(clap::Args, Debug, Default)]
pub struct TemplateArgs {
    /// Consumed states, e.g. "e,Ar" or "N2{X}!"
    #[arg(long)]
    pub consumes: Option<String>,

    /// Produced states, e.g. "e,Ar^+"
    #[arg(long)]
    pub produces: Option<String>,

    /// Reaction type tags, e.g. "elastic,ionization"
    #[arg(long)]
    pub tags: Option<String>,

    /// Reversibility filter: true, false, or both
    #[arg(long, default_value = "both")]
    pub reversible: String,

    /// Restrict to these set keys, comma-separated
    #[arg(long)]
    pub sets: Option<String>,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), XsecError> {
    let config = Config::load()?;
    let database = cli
        .database
        .or(config.database)
        .unwrap_or_else(|| PathBuf::from("xsecdb.redb"));
    let json_mode = cli.json_mode;
    let default_org = config.organization.as_deref();

    match cli.command {
        Some(Commands::Status) | None => cmd_status(&database, json_mode),
        Some(Commands::Init { force }) => cmd_init(&database, force),
        Some(Commands::Import { file }) => cmd_import(&database, json_mode, &file, default_org),
        Some(Commands::Update { set, file }) => {
            cmd_update(&database, json_mode, set, &file, default_org)
        }
        Some(Commands::Publish { set }) => cmd_publish(&database, set),
        Some(Commands::Delete { set, message }) => cmd_delete(&database, set, message.as_deref()),
        Some(Commands::History { set, item }) => cmd_history(&database, json_mode, set, item),
        Some(Commands::Export { set, output }) => cmd_export(&database, set, &output),
        Some(Commands::Search { template }) => cmd_search(&database, json_mode, &template),
        Some(Commands::Facets { template }) => cmd_facets(&database, json_mode, &template),
    }
}
