//! One synchronization run for one entity kind
//!
//! extract → normalize → fingerprint → diff → batch → apply, strictly in
//! sequence. The caller owns both collaborators and closes them afterwards.

use super::batch::{DEFAULT_BATCH_SIZE, plan_batches};
use super::diff::{ChangeSet, FingerprintMap, detect_changes};
use super::error::{SyncError, SyncResult};
use super::normalize::normalize;
use super::record::SyncRecord;
use super::report::{ReportBuilder, SyncReport};
use super::transaction::{TransactionCoordinator, TxState};
use crate::destination::DestinationStore;
use crate::destination::statement::max_batch_size;
use crate::schema::EntitySchema;
use crate::source::{RawRecord, SourceReader};

/// Per-run knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub batch_size: usize,
    /// Compute and report the change set without writing anything
    pub dry_run: bool,
    /// Create the destination table when it is missing
    pub create_tables: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
            create_tables: true,
        }
    }
}

/// Normalize, fingerprint and diff raw rows against a stored baseline
pub fn prepare(schema: &'static EntitySchema, raw: &[RawRecord], stored: &FingerprintMap) -> ChangeSet {
    let records: Vec<SyncRecord> = raw
        .iter()
        .map(|row| SyncRecord::new(normalize(schema, row)))
        .collect();
    detect_changes(records, stored)
}

/// Synchronize one entity kind.
///
/// All batches are written in a single destination transaction. On any write
/// failure the transaction is rolled back and the error returned; no report is
/// produced for a failed run.
pub async fn run_entity(
    source: &dyn SourceReader,
    dest: &mut dyn DestinationStore,
    schema: &'static EntitySchema,
    options: &SyncOptions,
) -> SyncResult<SyncReport> {
    log::info!(
        "Syncing {} from {} into {}",
        schema.name,
        source.describe(),
        dest.describe()
    );
    schema.validate().map_err(SyncError::Config)?;
    let limit = max_batch_size(dest.dialect(), schema);
    if options.batch_size > limit {
        return Err(SyncError::Config(format!(
            "batch size {} exceeds the {} rows of {} one statement can carry on {}",
            options.batch_size,
            limit,
            schema.name,
            dest.describe()
        )));
    }
    let mut report = ReportBuilder::new(schema.name);

    let raw = source.fetch_all(schema).await?;
    log::info!("Fetched {} rows from {}", raw.len(), schema.source_relation);

    if options.create_tables && !options.dry_run {
        dest.ensure_table(schema).await?;
    }

    let stored = dest.fetch_fingerprints(schema).await?;
    log::info!("Loaded {} stored fingerprints from {}", stored.len(), schema.table);

    let changes = prepare(schema, &raw, &stored);
    drop(raw);
    report.record_inspected(changes.inspected());
    report.record_changed(changes.len(), changes.duplicates());
    log::info!(
        "{} of {} {} rows changed",
        changes.len(),
        changes.inspected(),
        schema.name
    );

    if changes.is_empty() {
        log::info!("{} is up to date", schema.table);
        return Ok(report.finalize(TxState::Idle, options.dry_run));
    }

    let batches = plan_batches(changes.records(), options.batch_size);
    report.record_batches(batches.len());

    if options.dry_run {
        for key in changes.keys() {
            log::debug!("would write {}", key);
        }
        log::info!("Dry run: {} batches not written", batches.len());
        return Ok(report.finalize(TxState::Idle, true));
    }

    let mut tx = TransactionCoordinator::new(dest);
    for batch in &batches {
        let written = tx.apply(schema, batch).await?;
        log::debug!("{}: {} rows written", batch, written.len());
        report.record_written(written);
    }
    tx.commit().await?;

    let report = report.finalize(tx.state(), false);
    log::info!(
        "Committed {} rows into {} in {:.2}s",
        report.written,
        schema.table,
        report.duration().as_secs_f64()
    );
    Ok(report)
}
