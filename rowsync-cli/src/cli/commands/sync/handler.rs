//! Sync command handler

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use super::{OutputFormat, SyncCommands};
use crate::config::{self, DestinationConfig, SourceConfig, SyncConfig};
use crate::destination::{DestinationStore, PgDestination, SqliteDestination};
use crate::schema::{self, EntitySchema};
use crate::source::{CsvSource, PgSource, SourceReader};
use crate::sync::{SyncOptions, SyncReport, run_entity};

/// Reports of the entity kinds that synced and names of those that failed
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub reports: Vec<SyncReport>,
    pub failed: Vec<&'static str>,
}

/// Handle `rowsync sync <entity|all>`
pub async fn handle_sync_command(args: SyncCommands, config_path: Option<PathBuf>) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let schemas = select_entities(&args.entity)?;
    let config = config::load(&args.overrides(config_path)).context("Failed to load configuration")?;
    let options = config.options(args.dry_run);

    let source = open_source(&config).await?;
    let mut dest = match open_destination(&config).await {
        Ok(dest) => dest,
        Err(e) => {
            source.close().await;
            return Err(e);
        }
    };

    let summary = sync_entities(source.as_ref(), dest.as_mut(), &schemas, &options, args.format).await;

    dest.close().await;
    source.close().await;

    if args.format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&summary.reports).context("Failed to format JSON report")?;
        println!("{}", json);
    }

    if !summary.failed.is_empty() {
        anyhow::bail!(
            "{} of {} entity kinds failed: {}",
            summary.failed.len(),
            schemas.len(),
            summary.failed.join(", ")
        );
    }
    Ok(())
}

/// Resolve `all` or a single entity name
pub fn select_entities(name: &str) -> Result<Vec<&'static EntitySchema>> {
    if name.eq_ignore_ascii_case("all") {
        return Ok(schema::ALL.to_vec());
    }
    let schema = EntitySchema::find(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown entity '{}'. Run 'rowsync entities' to list the available kinds.",
            name
        )
    })?;
    Ok(vec![schema])
}

/// Run each entity kind in turn, each in its own transaction. A failed kind
/// does not stop the ones after it.
pub async fn sync_entities(
    source: &dyn SourceReader,
    dest: &mut dyn DestinationStore,
    schemas: &[&'static EntitySchema],
    options: &SyncOptions,
    format: OutputFormat,
) -> SyncSummary {
    let mut summary = SyncSummary::default();

    for &schema in schemas {
        match run_entity(source, dest, schema, options).await {
            Ok(report) => {
                if format == OutputFormat::Text {
                    println!("{}", report);
                }
                summary.reports.push(report);
            }
            Err(e) => {
                log::error!("Sync of {} failed: {}", schema.name, e);
                if format == OutputFormat::Text {
                    eprintln!(
                        "{} {}: {}",
                        "Sync failed".red().bold(),
                        schema.name,
                        e
                    );
                    if e.is_write_phase() {
                        eprintln!("{}", "All batches of this run were rolled back.".yellow());
                    }
                }
                summary.failed.push(schema.name);
            }
        }
    }

    summary
}

async fn open_source(config: &SyncConfig) -> Result<Box<dyn SourceReader>> {
    let source: Box<dyn SourceReader> = match &config.source {
        SourceConfig::Postgres { url } => Box::new(
            PgSource::connect(url, config.connect_timeout)
                .await
                .context("Failed to connect to the source database")?,
        ),
        SourceConfig::CsvDir { dir, delimiter } => {
            Box::new(CsvSource::new(dir.clone()).with_delimiter(*delimiter))
        }
    };
    log::info!("Source: {}", source.describe());
    Ok(source)
}

async fn open_destination(config: &SyncConfig) -> Result<Box<dyn DestinationStore>> {
    let dest: Box<dyn DestinationStore> = match &config.destination {
        DestinationConfig::Postgres { url } => Box::new(
            PgDestination::connect(url, config.connect_timeout)
                .await
                .context("Failed to connect to the destination database")?,
        ),
        DestinationConfig::Sqlite { url } => Box::new(
            SqliteDestination::connect(url, config.connect_timeout)
                .await
                .context("Failed to open the destination database")?,
        ),
    };
    log::info!("Destination: {}", dest.describe());
    Ok(dest)
}
