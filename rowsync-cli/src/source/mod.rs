//! Source collaborators
//!
//! A source produces every current row of one entity kind as loosely typed
//! [`RawRecord`]s. Nothing here interprets the values; that is the
//! normalizer's job.

pub mod csv_dir;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::schema::EntitySchema;
use crate::sync::SyncResult;

pub use self::csv_dir::CsvSource;
pub use self::postgres::PgSource;

/// A value as delivered by the source, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

static NULL: RawValue = RawValue::Null;

/// One source row, keyed by column name without regard to case
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    columns: HashMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: &str, value: RawValue) {
        self.columns.insert(column.to_ascii_lowercase(), value);
    }

    /// Value of `column`, or [`RawValue::Null`] when the source did not return it
    pub fn get(&self, column: &str) -> &RawValue {
        self.columns
            .get(&column.to_ascii_lowercase())
            .unwrap_or(&NULL)
    }

    /// Build a record of text values
    #[cfg(test)]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k, RawValue::Text(v.to_string())))
            .collect()
    }
}

impl<'a> FromIterator<(&'a str, RawValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (&'a str, RawValue)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// Read-only access to the source store
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Human readable description for logs
    fn describe(&self) -> String;

    /// Produce all current rows for one entity kind, fully in memory
    async fn fetch_all(&self, schema: &'static EntitySchema) -> SyncResult<Vec<RawRecord>>;

    /// Release connections; called once the run is over
    async fn close(&self) {}
}
