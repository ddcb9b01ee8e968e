//! Command line interface

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::sync::SyncCommands;

#[derive(Parser)]
#[command(name = "rowsync")]
#[command(about = "Incremental fingerprint-based synchronization of entity snapshots")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to <config dir>/rowsync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize one entity kind, or all of them
    Sync(SyncCommands),
    /// List the built-in entity kinds and their natural keys
    Entities {
        /// Show the fields of one entity kind
        name: Option<String>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync(args) => commands::sync::handler::handle_sync_command(args, cli.config).await,
        Commands::Entities { name } => commands::entities::handle_entities_command(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_flags() {
        let cli = Cli::try_parse_from([
            "rowsync",
            "--config",
            "/etc/rowsync.toml",
            "sync",
            "stock",
            "--batch-size",
            "50",
            "--dry-run",
            "--no-create",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/rowsync.toml")));
        let Commands::Sync(args) = cli.command else {
            panic!("expected sync command");
        };
        assert_eq!(args.entity, "stock");
        assert_eq!(args.batch_size, Some(50));
        assert!(args.dry_run);
        assert!(args.no_create);
    }

    #[test]
    fn test_sync_requires_entity() {
        assert!(Cli::try_parse_from(["rowsync", "sync"]).is_err());
        assert!(Cli::try_parse_from(["rowsync", "entities"]).is_ok());
        assert!(Cli::try_parse_from(["rowsync", "entities", "stock"]).is_ok());
    }
}
