//! # xsecdb - Cross-Section Curation CLI
//!
//! The main binary for the xsecdb versioned curation engine.
//!
//! This application provides:
//! - CLI interface for submitting, versioning, and publishing data
//! - Faceted search over the published catalog
//! - JSON export of resolved sets and items
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │              apps/xsecdb (THE BINARY)          │
//! │                                                │
//! │  ┌─────────────┐         ┌──────────────────┐  │
//! │  │   CLI       │         │  Config loader   │  │
//! │  │  (clap)     │         │  (xsecdb.toml)   │  │
//! │  └──────┬──────┘         └────────┬─────────┘  │
//! │         │                         │            │
//! │         └────────────┬────────────┘            │
//! │                      ▼                         │
//! │              ┌───────────────┐                 │
//! │              │  xsecdb-core  │                 │
//! │              │  (THE LOGIC)  │                 │
//! │              └───────────────┘                 │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! xsecdb status
//! xsecdb import -f argon.json
//! xsecdb publish --set 0
//! xsecdb search --tags ionization --consumes Ar
//! ```

mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing; XSECDB_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("XSECDB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "xsecdb=debug"
    } else {
        "xsecdb=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the xsecdb startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗  ██╗███████╗███████╗ ██████╗██████╗ ██████╗
  ╚██╗██╔╝██╔════╝██╔════╝██╔════╝██╔══██╗██╔══██╗
   ╚███╔╝ ███████╗█████╗  ██║     ██║  ██║██████╔╝
   ██╔██╗ ╚════██║██╔══╝  ██║     ██║  ██║██╔══██╗
  ██╔╝ ██╗███████║███████╗╚██████╗██████╔╝██████╔╝
  ╚═╝  ╚═╝╚══════╝╚══════╝ ╚═════╝╚═════╝ ╚═════╝

  Cross-Section Curation Engine v{}

  Versioned • Deduplicated • Searchable
"#,
        env!("CARGO_PKG_VERSION")
    );
}
