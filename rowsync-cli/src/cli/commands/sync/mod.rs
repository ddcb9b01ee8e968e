//! `rowsync sync` arguments

pub mod handler;

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::config::ConfigOverrides;

#[derive(Args, Debug)]
pub struct SyncCommands {
    /// Entity kind to synchronize (see `rowsync entities`), or `all`
    pub entity: String,

    /// Maximum records per upsert statement
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Compute and report the change set without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Do not create missing destination tables
    #[arg(long)]
    pub no_create: bool,

    /// Source database URL (overrides ROWSYNC_SOURCE_URL)
    #[arg(long, value_name = "URL", conflicts_with = "source_csv_dir")]
    pub source_url: Option<String>,

    /// Directory of CSV exports to read instead of a database
    #[arg(long, value_name = "DIR")]
    pub source_csv_dir: Option<PathBuf>,

    /// Destination database URL (overrides DATABASE_URL)
    #[arg(long, value_name = "URL")]
    pub destination_url: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable report
    Text,
    /// JSON array of reports
    Json,
}

impl SyncCommands {
    pub fn overrides(&self, config_path: Option<PathBuf>) -> ConfigOverrides {
        ConfigOverrides {
            config_path,
            source_url: self.source_url.clone(),
            source_csv_dir: self.source_csv_dir.clone(),
            destination_url: self.destination_url.clone(),
            batch_size: self.batch_size,
            no_create: self.no_create,
        }
    }
}
