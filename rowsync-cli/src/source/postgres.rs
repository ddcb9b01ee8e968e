//! PostgreSQL source
//!
//! Reads the entity's source view with `SELECT *` and turns every column into
//! a [`RawValue`] according to its database type.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo};

use super::{RawRecord, RawValue, SourceReader};
use crate::config::redact_url;
use crate::destination::statement::quote_relation;
use crate::schema::EntitySchema;
use crate::sync::{SyncError, SyncResult};

pub struct PgSource {
    pool: PgPool,
    label: String,
}

impl PgSource {
    pub async fn connect(url: &str, connect_timeout: Duration) -> SyncResult<Self> {
        let label = redact_url(url);
        log::debug!("Connecting to source {}", label);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await
            .map_err(|e| SyncError::source_unavailable(format!("cannot connect to {}", label), e))?;

        Ok(Self { pool, label })
    }
}

/// Decode one column by its declared type. Unknown types are read as text
/// when possible, otherwise as missing.
fn decode_column(row: &PgRow, index: usize) -> Result<RawValue, sqlx::Error> {
    let type_name = row.columns()[index].type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(RawValue::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)?
            .map(|n| RawValue::Int(i64::from(n))),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)?
            .map(|n| RawValue::Int(i64::from(n))),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(RawValue::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|n| RawValue::Float(f64::from(n))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(RawValue::Float),
        // exact decimal text; rounding happens in the normalizer
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)?
            .map(|d| RawValue::Text(d.normalize().to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(RawValue::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|ts| RawValue::Timestamp(ts.and_utc())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ts| RawValue::Timestamp(ts.and_utc())),
        _ => match row.try_get::<Option<String>, _>(index) {
            Ok(text) => text.map(RawValue::Text),
            Err(e) => {
                log::debug!(
                    "Column {} has unsupported type {}: {}",
                    row.columns()[index].name(),
                    type_name,
                    e
                );
                None
            }
        },
    };
    Ok(value.unwrap_or(RawValue::Null))
}

fn decode_row(row: &PgRow) -> Result<RawRecord, sqlx::Error> {
    let mut record = RawRecord::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name(), decode_column(row, index)?);
    }
    Ok(record)
}

#[async_trait]
impl SourceReader for PgSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn fetch_all(&self, schema: &'static EntitySchema) -> SyncResult<Vec<RawRecord>> {
        let sql = format!("SELECT * FROM {}", quote_relation(schema.source_relation));
        log::debug!("Source query: {}", sql);

        let mut rows = sqlx::query(&sql).fetch(&self.pool);
        let mut records = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(|e| {
            SyncError::source_unavailable(format!("cannot read {}", schema.source_relation), e)
        })? {
            let record = decode_row(&row).map_err(|e| {
                SyncError::source_unavailable(format!("cannot decode a row of {}", schema.source_relation), e)
            })?;
            records.push(record);
        }
        Ok(records)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use chrono::TimeZone;

    static LOT_FIELDS: [FieldDef; 2] = [
        FieldDef::text("id", "ID").key(),
        FieldDef::decimal("qty", "QTY"),
    ];

    static LOTS: EntitySchema = EntitySchema {
        name: "lots",
        description: "",
        table: "lots",
        source_relation: "public.View_Rowsync_Test_Lots",
        fields: &LOT_FIELDS,
    };

    #[tokio::test]
    async fn test_fetch_all_decodes_column_types() {
        let Ok(url) = std::env::var("ROWSYNC_TEST_DATABASE_URL") else {
            eprintln!("ROWSYNC_TEST_DATABASE_URL not set, skipping");
            return;
        };
        let source = PgSource::connect(&url, Duration::from_secs(10)).await.unwrap();
        sqlx::query(r#"DROP TABLE IF EXISTS "View_Rowsync_Test_Lots""#)
            .execute(&source.pool)
            .await
            .unwrap();
        sqlx::query(
            r#"CREATE TABLE "View_Rowsync_Test_Lots" (
                "ID" TEXT, "QTY" NUMERIC(15,3), "N" INT4, "F" FLOAT8,
                "OK" BOOL, "AT" TIMESTAMP, "DAY" DATE, "GONE" TEXT
            )"#,
        )
        .execute(&source.pool)
        .await
        .unwrap();
        sqlx::query(
            r#"INSERT INTO "View_Rowsync_Test_Lots" VALUES
                ('L1', 12.500, 7, 1.5, true, '2025-06-01 10:15:00', '2025-06-02', NULL)"#,
        )
        .execute(&source.pool)
        .await
        .unwrap();

        let rows = source.fetch_all(&LOTS).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("id"), &RawValue::Text("L1".into()));
        assert_eq!(row.get("qty"), &RawValue::Text("12.5".into()));
        assert_eq!(row.get("n"), &RawValue::Int(7));
        assert_eq!(row.get("f"), &RawValue::Float(1.5));
        assert_eq!(row.get("ok"), &RawValue::Bool(true));
        assert_eq!(
            row.get("at"),
            &RawValue::Timestamp(Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap())
        );
        assert_eq!(
            row.get("day"),
            &RawValue::Timestamp(Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(row.get("gone"), &RawValue::Null);

        sqlx::query(r#"DROP TABLE "View_Rowsync_Test_Lots""#)
            .execute(&source.pool)
            .await
            .unwrap();
        source.close().await;
    }

    #[tokio::test]
    async fn test_missing_relation_is_source_unavailable() {
        let Ok(url) = std::env::var("ROWSYNC_TEST_DATABASE_URL") else {
            eprintln!("ROWSYNC_TEST_DATABASE_URL not set, skipping");
            return;
        };
        static MISSING: EntitySchema = EntitySchema {
            name: "missing",
            description: "",
            table: "missing",
            source_relation: "View_Rowsync_Does_Not_Exist",
            fields: &LOT_FIELDS,
        };
        let source = PgSource::connect(&url, Duration::from_secs(10)).await.unwrap();
        let err = source.fetch_all(&MISSING).await.unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable { .. }));
        source.close().await;
    }
}
