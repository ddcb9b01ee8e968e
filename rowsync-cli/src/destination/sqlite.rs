//! SQLite destination
//!
//! Same table layout and upsert as PostgreSQL. Used for local mirrors and by
//! the engine's tests.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::DestinationStore;
use super::statement::{self, Dialect, Param};
use crate::schema::EntitySchema;
use crate::sync::{Fingerprint, FingerprintMap, NaturalKey, SyncError, SyncRecord, SyncResult, Value};

pub struct SqliteDestination {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
    label: String,
}

impl SqliteDestination {
    /// Connect with a `sqlite://` URL, creating the database file if missing
    pub async fn connect(url: &str, connect_timeout: Duration) -> SyncResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| SyncError::destination_unavailable(format!("invalid SQLite URL {}", url), e))?
            .create_if_missing(true);
        Self::with_options(options, url.to_string(), connect_timeout).await
    }

    /// Open (or create) a database file
    #[cfg(test)]
    pub async fn open(path: impl AsRef<std::path::Path>) -> SyncResult<Self> {
        use crate::config::DEFAULT_CONNECT_TIMEOUT_SECS;

        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::with_options(
            options,
            format!("sqlite://{}", path.display()),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
        .await
    }

    async fn with_options(
        options: SqliteConnectOptions,
        label: String,
        connect_timeout: Duration,
    ) -> SyncResult<Self> {
        log::debug!("Opening destination {}", label);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| SyncError::destination_unavailable(format!("cannot open {}", label), e))?;

        Ok(Self {
            pool,
            tx: None,
            label,
        })
    }
}

fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    param: Param<'q>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        Param::Value(Value::String(s)) => query.bind(s.as_str()),
        Param::Value(Value::Int(n)) => query.bind(*n),
        Param::Value(Value::Decimal(d)) => query.bind(*d),
        Param::Value(Value::Bool(b)) => query.bind(*b),
        Param::Value(Value::Timestamp(ts)) => query.bind(*ts),
        Param::Fingerprint(fp) => query.bind(fp),
    }
}

fn read_key(row: &SqliteRow, width: usize) -> Result<NaturalKey, sqlx::Error> {
    (0..width)
        .map(|i| row.try_get::<String, _>(i))
        .collect::<Result<Vec<_>, _>>()
        .map(NaturalKey::new)
}

#[async_trait]
impl DestinationStore for SqliteDestination {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn ensure_table(&mut self, schema: &'static EntitySchema) -> SyncResult<()> {
        let ddl = statement::create_table(Dialect::Sqlite, schema);
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                SyncError::destination_unavailable(format!("cannot create table {}", schema.table), e)
            })?;
        Ok(())
    }

    async fn fetch_fingerprints(&mut self, schema: &'static EntitySchema) -> SyncResult<FingerprintMap> {
        let sql = statement::select_fingerprints(schema);
        let width = schema.key_indices().len();

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                SyncError::destination_unavailable(format!("cannot read fingerprints from {}", schema.table), e)
            })?;

        let mut stored = FingerprintMap::with_capacity(rows.len());
        for row in &rows {
            let key = read_key(row, width).map_err(|e| {
                SyncError::destination_unavailable(format!("unreadable key in {}", schema.table), e)
            })?;
            let hash: Option<String> = row.try_get(width).map_err(|e| {
                SyncError::destination_unavailable(format!("unreadable row_hash in {}", schema.table), e)
            })?;
            if let Some(hash) = hash {
                stored.insert(key, Fingerprint::from_stored(hash));
            }
        }
        Ok(stored)
    }

    async fn begin(&mut self) -> SyncResult<()> {
        if self.tx.is_some() {
            return Err(SyncError::InvalidTransition {
                action: "begin",
                state: "a transaction is already open".to_string(),
            });
        }
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SyncError::write_failure("cannot begin transaction", e))?;
        self.tx = Some(tx);
        Ok(())
    }

    async fn upsert_batch(
        &mut self,
        schema: &'static EntitySchema,
        records: &[SyncRecord],
    ) -> SyncResult<Vec<NaturalKey>> {
        let Some(tx) = self.tx.as_mut() else {
            return Err(SyncError::InvalidTransition {
                action: "upsert",
                state: "no transaction is open".to_string(),
            });
        };
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let stmt = statement::upsert(Dialect::Sqlite, schema, records);
        let query = stmt
            .params
            .into_iter()
            .fold(sqlx::query(&stmt.sql), bind);

        let rows = query
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| SyncError::write_failure(format!("upsert into {} failed", schema.table), e))?;

        let width = schema.key_indices().len();
        rows.iter()
            .map(|row| read_key(row, width))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SyncError::write_failure(format!("unreadable key returned by {}", schema.table), e))
    }

    async fn commit(&mut self) -> SyncResult<()> {
        let tx = self.tx.take().ok_or_else(|| SyncError::InvalidTransition {
            action: "commit",
            state: "no transaction is open".to_string(),
        })?;
        tx.commit()
            .await
            .map_err(|e| SyncError::write_failure("commit failed", e))
    }

    async fn rollback(&mut self) -> SyncResult<()> {
        match self.tx.take() {
            Some(tx) => tx
                .rollback()
                .await
                .map_err(|e| SyncError::write_failure("rollback failed", e)),
            None => Ok(()),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.rollback().await {
            log::warn!("Failed to roll back on close: {}", e);
        }
        self.pool.close().await;
    }
}
