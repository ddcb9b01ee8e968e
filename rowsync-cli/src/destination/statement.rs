//! Schema-driven SQL statements for the destination
//!
//! Identifiers only ever come from the static entity schemas and are quoted;
//! every record value travels as a bound parameter. No value text is ever
//! spliced into the SQL string.

use crate::schema::{EntitySchema, FieldDef, FieldType, ROW_HASH_COLUMN};
use crate::sync::fingerprint::FINGERPRINT_LEN;
use crate::sync::{SyncRecord, Value};

/// SQL flavour of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Placeholder for the `n`th (1-based) bound parameter
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Most bound parameters one statement may carry
    pub fn max_params(&self) -> usize {
        match self {
            Dialect::Postgres => 65_535,
            // SQLITE_MAX_VARIABLE_NUMBER since SQLite 3.32
            Dialect::Sqlite => 32_766,
        }
    }

    /// Column type for a field
    pub fn column_type(&self, field: &FieldDef) -> &'static str {
        match (self, field.field_type) {
            (_, FieldType::Text) => "VARCHAR(255)",
            (_, FieldType::LongText) => "TEXT",
            (Dialect::Postgres, FieldType::Decimal) => "NUMERIC(15,2)",
            (Dialect::Sqlite, FieldType::Decimal) => "REAL",
            (_, FieldType::BoundedInteger { .. }) => "INTEGER",
            (Dialect::Postgres, FieldType::Timestamp) => "TIMESTAMPTZ",
            (Dialect::Sqlite, FieldType::Timestamp) => "TEXT",
            (_, FieldType::Boolean) => "BOOLEAN",
        }
    }
}

/// Largest batch whose upsert stays within the dialect's parameter limit
pub fn max_batch_size(dialect: Dialect, schema: &EntitySchema) -> usize {
    dialect.max_params() / (schema.fields.len() + 1)
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified relation name (`dbo.View_X`)
pub fn quote_relation(name: &str) -> String {
    name.split('.').map(quote_ident).collect::<Vec<_>>().join(".")
}

/// SQL text plus the values to bind, in placeholder order
#[derive(Debug)]
pub struct Statement<'a> {
    pub sql: String,
    pub params: Vec<Param<'a>>,
}

/// One bound parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param<'a> {
    Value(&'a Value),
    Fingerprint(&'a str),
}

/// `CREATE TABLE IF NOT EXISTS` for an entity kind; never alters an existing table
pub fn create_table(dialect: Dialect, schema: &EntitySchema) -> String {
    let mut columns: Vec<String> = schema
        .fields
        .iter()
        .map(|field| {
            let mut column = format!("{} {}", quote_ident(field.name), dialect.column_type(field));
            if !field.nullable {
                column.push_str(" NOT NULL");
            }
            column
        })
        .collect();
    columns.push(format!("{} VARCHAR({})", quote_ident(ROW_HASH_COLUMN), FINGERPRINT_LEN));
    columns.push(format!("PRIMARY KEY ({})", key_columns(schema)));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(schema.table),
        columns.join(",\n    ")
    )
}

/// Select the natural key columns and stored fingerprint of every row
pub fn select_fingerprints(schema: &EntitySchema) -> String {
    format!(
        "SELECT {}, {} FROM {}",
        key_columns(schema),
        quote_ident(ROW_HASH_COLUMN),
        quote_ident(schema.table)
    )
}

/// Build the batch upsert.
///
/// Inserts every record, or overwrites every non-key column plus the
/// fingerprint of an existing row when its stored fingerprint differs.
/// `RETURNING` yields the key of each row actually written.
pub fn upsert<'a>(dialect: Dialect, schema: &EntitySchema, batch: &'a [SyncRecord]) -> Statement<'a> {
    let table = quote_ident(schema.table);
    let columns: Vec<String> = schema
        .fields
        .iter()
        .map(|f| quote_ident(f.name))
        .chain(std::iter::once(quote_ident(ROW_HASH_COLUMN)))
        .collect();
    let width = columns.len();

    let mut params = Vec::with_capacity(batch.len() * width);
    let mut rows = Vec::with_capacity(batch.len());
    for record in batch {
        let placeholders: Vec<String> = (0..width)
            .map(|i| dialect.placeholder(params.len() + i + 1))
            .collect();
        rows.push(format!("({})", placeholders.join(", ")));

        params.extend(record.record.values().iter().map(Param::Value));
        params.push(Param::Fingerprint(record.fingerprint.as_str()));
    }

    let assignments: Vec<String> = schema
        .value_fields()
        .map(|f| f.name)
        .chain(std::iter::once(ROW_HASH_COLUMN))
        .map(|name| {
            let column = quote_ident(name);
            format!("{column} = EXCLUDED.{column}")
        })
        .collect();
    let row_hash = quote_ident(ROW_HASH_COLUMN);

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES {} \
         ON CONFLICT ({}) DO UPDATE SET {} \
         WHERE {table}.{row_hash} IS DISTINCT FROM EXCLUDED.{row_hash} \
         RETURNING {}",
        columns.join(", "),
        rows.join(", "),
        key_columns(schema),
        assignments.join(", "),
        key_columns(schema),
    );

    Statement { sql, params }
}

fn key_columns(schema: &EntitySchema) -> String {
    schema
        .key_fields()
        .map(|f| quote_ident(f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ACHATS, PRODUCTS, SALES, VENTE_DETAIL};
    use crate::source::RawRecord;
    use crate::sync::normalize::normalize;

    fn sale(code: &str, name: &str) -> SyncRecord {
        SyncRecord::new(normalize(
            &SALES,
            &RawRecord::from_pairs([("CODE_PRODUIT", code), ("DESIGNATION_PRODUIT", name), ("NET_SALES", "3")]),
        ))
    }

    #[test]
    fn test_postgres_upsert_shape() {
        let batch = vec![sale("P1", "One"), sale("P2", "Two")];
        let stmt = upsert(Dialect::Postgres, &SALES, &batch);

        assert_eq!(
            stmt.sql,
            "INSERT INTO \"sales\" (\"code_produit\", \"designation_produit\", \"net_sales\", \"row_hash\") \
             VALUES ($1, $2, $3, $4), ($5, $6, $7, $8) \
             ON CONFLICT (\"code_produit\") DO UPDATE SET \
             \"designation_produit\" = EXCLUDED.\"designation_produit\", \
             \"net_sales\" = EXCLUDED.\"net_sales\", \
             \"row_hash\" = EXCLUDED.\"row_hash\" \
             WHERE \"sales\".\"row_hash\" IS DISTINCT FROM EXCLUDED.\"row_hash\" \
             RETURNING \"code_produit\""
        );
        assert_eq!(stmt.params.len(), 8);
        assert_eq!(stmt.params[0], Param::Value(&batch[0].record.values()[0]));
        assert_eq!(stmt.params[7], Param::Fingerprint(batch[1].fingerprint.as_str()));
    }

    #[test]
    fn test_sqlite_uses_positional_placeholders() {
        let batch = vec![sale("P1", "One")];
        let stmt = upsert(Dialect::Sqlite, &SALES, &batch);
        assert!(stmt.sql.contains("VALUES (?, ?, ?, ?) ON CONFLICT"));
        assert!(!stmt.sql.contains('$'));
    }

    #[test]
    fn test_values_never_reach_sql_text() {
        let hostile = "x'); DROP TABLE sales; --";
        let batch = vec![sale(hostile, hostile)];
        let stmt = upsert(Dialect::Postgres, &SALES, &batch);

        assert!(!stmt.sql.contains("DROP TABLE"));
        assert!(stmt.params.contains(&Param::Value(&Value::String(hostile.to_string()))));
    }

    #[test]
    fn test_composite_key_conflict_target() {
        let stmt = upsert(Dialect::Postgres, &VENTE_DETAIL, &[]);
        assert!(stmt.sql.contains("ON CONFLICT (\"num_vente\", \"id_stock\")"));
        assert!(stmt.sql.ends_with("RETURNING \"num_vente\", \"id_stock\""));
        assert!(!stmt.sql.contains("\"num_vente\" = EXCLUDED"));
    }

    #[test]
    fn test_create_table() {
        let ddl = create_table(Dialect::Postgres, &PRODUCTS);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"products\" ("));
        assert!(ddl.contains("\"code_produit\" VARCHAR(255) NOT NULL"));
        assert!(ddl.contains("\"qte_stock\" NUMERIC(15,2) NOT NULL"));
        assert!(ddl.contains("\"row_hash\" VARCHAR(64)"));
        assert!(ddl.contains("PRIMARY KEY (\"code_produit\")"));

        let ddl = create_table(Dialect::Sqlite, &VENTE_DETAIL);
        assert!(ddl.contains("\"created_on\" TEXT,"));
        assert!(ddl.contains("PRIMARY KEY (\"num_vente\", \"id_stock\")"));
    }

    #[test]
    fn test_select_fingerprints() {
        assert_eq!(
            select_fingerprints(&VENTE_DETAIL),
            "SELECT \"num_vente\", \"id_stock\", \"row_hash\" FROM \"vente_detail\""
        );
    }

    #[test]
    fn test_max_batch_size_respects_parameter_limit() {
        assert_eq!(max_batch_size(Dialect::Postgres, &ACHATS), 1771);
        assert_eq!(max_batch_size(Dialect::Sqlite, &ACHATS), 885);
        assert_eq!(max_batch_size(Dialect::Postgres, &SALES), 16_383);

        for schema in crate::schema::ALL {
            let width = schema.fields.len() + 1;
            let rows = max_batch_size(Dialect::Postgres, schema);
            assert!(rows * width <= 65_535);
            assert!((rows + 1) * width > 65_535);
        }
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_relation("dbo.View_STK_PRODUITS"), "\"dbo\".\"View_STK_PRODUITS\"");
    }
}
