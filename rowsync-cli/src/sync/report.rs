//! Per-run summary

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use colored::*;
use serde::Serialize;

use super::record::NaturalKey;
use super::transaction::TxState;

/// Keys listed in the text report before the rest are summarized
const MAX_LISTED_KEYS: usize = 20;

/// What one run did. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub entity: String,
    pub inspected: usize,
    pub changed: usize,
    pub written: usize,
    pub written_keys: Vec<String>,
    pub duplicates: usize,
    pub batches: usize,
    pub duration_ms: u64,
    pub outcome: TxState,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.dry_run {
            format!("Sync Report: {} (dry run)", self.entity)
        } else {
            format!("Sync Report: {}", self.entity)
        };
        writeln!(f, "{}", "=".repeat(40).dimmed())?;
        writeln!(f, "{}", title.bold())?;
        writeln!(f, "{}", "=".repeat(40).dimmed())?;
        writeln!(f, "Inspected:  {}", self.inspected)?;
        writeln!(f, "Changed:    {}", self.changed.to_string().yellow())?;
        writeln!(f, "Written:    {}", self.written.to_string().green())?;
        if self.duplicates > 0 {
            writeln!(f, "Duplicates: {}", self.duplicates.to_string().red())?;
        }
        writeln!(f, "Batches:    {}", self.batches)?;
        writeln!(f, "Duration:   {:.2}s", self.duration().as_secs_f64())?;
        writeln!(f, "Outcome:    {}", self.outcome)?;

        if !self.written_keys.is_empty() {
            let shown: Vec<&str> = self
                .written_keys
                .iter()
                .take(MAX_LISTED_KEYS)
                .map(String::as_str)
                .collect();
            write!(f, "Keys:       {}", shown.join(", ").cyan())?;
            if self.written_keys.len() > MAX_LISTED_KEYS {
                write!(f, " (+{} more)", self.written_keys.len() - MAX_LISTED_KEYS)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Accumulates run figures until the transaction reaches a terminal state
#[derive(Debug)]
pub struct ReportBuilder {
    entity: String,
    started: Instant,
    inspected: usize,
    changed: usize,
    duplicates: usize,
    batches: usize,
    written_keys: Vec<NaturalKey>,
    seen: HashSet<NaturalKey>,
}

impl ReportBuilder {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            started: Instant::now(),
            inspected: 0,
            changed: 0,
            duplicates: 0,
            batches: 0,
            written_keys: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn record_inspected(&mut self, count: usize) {
        self.inspected += count;
    }

    pub fn record_changed(&mut self, count: usize, duplicates: usize) {
        self.changed += count;
        self.duplicates += duplicates;
    }

    pub fn record_batches(&mut self, count: usize) {
        self.batches += count;
    }

    /// Add written keys, keeping first-written order and dropping repeats
    pub fn record_written(&mut self, keys: impl IntoIterator<Item = NaturalKey>) {
        for key in keys {
            if self.seen.insert(key.clone()) {
                self.written_keys.push(key);
            }
        }
    }

    pub fn finalize(self, outcome: TxState, dry_run: bool) -> SyncReport {
        SyncReport {
            entity: self.entity,
            inspected: self.inspected,
            changed: self.changed,
            written: self.written_keys.len(),
            written_keys: self.written_keys.iter().map(ToString::to_string).collect(),
            duplicates: self.duplicates,
            batches: self.batches,
            duration_ms: self.started.elapsed().as_millis() as u64,
            outcome,
            dry_run,
        }
    }
}
