//! Destination stores
//!
//! A destination holds one table per entity kind, keyed by the natural key and
//! carrying a `row_hash` column with the fingerprint of the last written
//! version of each row.

pub mod postgres;
pub mod sqlite;
pub mod statement;

use async_trait::async_trait;

use self::statement::Dialect;
use crate::schema::EntitySchema;
use crate::sync::{FingerprintMap, NaturalKey, SyncRecord, SyncResult};

pub use self::postgres::PgDestination;
pub use self::sqlite::SqliteDestination;

/// Storage the engine writes changed records into.
///
/// Writes happen between `begin` and `commit`/`rollback`; every
/// `upsert_batch` inside that window belongs to the same transaction.
#[async_trait]
pub trait DestinationStore: Send {
    /// Human readable location, without credentials
    fn describe(&self) -> String;

    fn dialect(&self) -> Dialect;

    /// Create the entity table if it does not exist yet
    async fn ensure_table(&mut self, schema: &'static EntitySchema) -> SyncResult<()>;

    /// Stored fingerprint of every row, keyed by natural key.
    ///
    /// Rows with a NULL `row_hash` are omitted and therefore treated as changed.
    async fn fetch_fingerprints(&mut self, schema: &'static EntitySchema) -> SyncResult<FingerprintMap>;

    async fn begin(&mut self) -> SyncResult<()>;

    /// Upsert one batch inside the open transaction.
    ///
    /// Returns the keys of the rows actually inserted or updated; rows whose
    /// stored fingerprint already matched are left untouched and not returned.
    async fn upsert_batch(
        &mut self,
        schema: &'static EntitySchema,
        records: &[SyncRecord],
    ) -> SyncResult<Vec<NaturalKey>>;

    async fn commit(&mut self) -> SyncResult<()>;

    async fn rollback(&mut self) -> SyncResult<()>;

    /// Release connections. Any open transaction is rolled back.
    async fn close(&mut self) {}
}
