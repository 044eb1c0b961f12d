//! # Team Search CLI (`tsearch`)
//!
//! The `tsearch` binary drives index maintenance and serves the search
//! HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! tsearch --config ./config/tsearch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tsearch rebuild` | Drop, recreate, and reindex every collection |
//! | `tsearch reindex project <id>` | Refresh one project document |
//! | `tsearch reindex discussion <id>` | Refresh one discussion document |
//! | `tsearch serve` | Start the search HTTP API |
//!
//! `rebuild` is intended for deployment/maintenance time, not for every
//! process start of the serving path.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use team_search::{config, rebuild, server, writer};

/// Team Search — access-control-aware search indexing and federated
/// query over projects, discussions, and learning content.
#[derive(Parser)]
#[command(
    name = "tsearch",
    about = "Access-control-aware search indexing and federated query service",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tsearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Drop, recreate, and reindex every collection.
    ///
    /// Processes content types sequentially; a failure in one type is
    /// reported but does not stop the others. Exits nonzero when any
    /// type failed.
    Rebuild,

    /// Refresh a single document after a source-of-truth change.
    Reindex {
        #[command(subcommand)]
        target: ReindexTarget,
    },

    /// Start the search HTTP API.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// `/api/search` plus the internal reindex hooks.
    Serve,
}

/// Reindex targets.
#[derive(Subcommand)]
enum ReindexTarget {
    /// Refresh one project's index document.
    Project {
        /// Project primary key.
        id: i64,
    },
    /// Refresh one discussion's index document.
    Discussion {
        /// Discussion primary key.
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("team_search=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Rebuild => {
            rebuild::run_rebuild(&cfg).await?;
        }
        Commands::Reindex { target } => match target {
            ReindexTarget::Project { id } => {
                writer::run_reindex_project(&cfg, id).await?;
            }
            ReindexTarget::Discussion { id } => {
                writer::run_reindex_discussion(&cfg, id).await?;
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
