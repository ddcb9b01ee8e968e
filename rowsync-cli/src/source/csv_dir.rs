//! Directory of CSV exports, one file per entity kind

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{RawRecord, RawValue, SourceReader};
use crate::schema::EntitySchema;
use crate::sync::{SyncError, SyncResult};

/// Reads `<dir>/<source relation>.csv`, falling back to `<dir>/<entity>.csv`.
///
/// The header row names the columns. Empty cells are treated as missing values.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Export file for an entity kind, if one exists
    pub fn file_for(&self, schema: &EntitySchema) -> Option<PathBuf> {
        [schema.source_relation, schema.name]
            .iter()
            .map(|stem| self.dir.join(format!("{stem}.csv")))
            .find(|path| path.is_file())
    }
}

fn read_file(path: &Path, delimiter: u8) -> Result<Vec<RawRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = RawRecord::new();
        for (column, cell) in headers.iter().zip(record.iter()) {
            let value = if cell.is_empty() {
                RawValue::Null
            } else {
                RawValue::Text(cell.to_string())
            };
            row.insert(column, value);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[async_trait]
impl SourceReader for CsvSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.dir.display())
    }

    async fn fetch_all(&self, schema: &'static EntitySchema) -> SyncResult<Vec<RawRecord>> {
        let path = self.file_for(schema).ok_or_else(|| SyncError::SourceUnavailable {
            message: format!(
                "no {}.csv or {}.csv in {}",
                schema.source_relation,
                schema.name,
                self.dir.display()
            ),
            source: None,
        })?;
        log::debug!("Reading {}", path.display());

        let delimiter = self.delimiter;
        let display = path.display().to_string();
        tokio::task::spawn_blocking(move || read_file(&path, delimiter))
            .await
            .map_err(|e| SyncError::source_unavailable(format!("reading {} panicked", display), e))?
            .map_err(|e| SyncError::source_unavailable(format!("cannot read {}", display), e))
    }
}
