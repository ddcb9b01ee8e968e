//! Entity schemas
//!
//! Every synchronized entity kind is described by a static [`EntitySchema`]:
//! the destination table, the source relation it is extracted from, and an
//! ordered field list. The declaration order of the fields is the significant
//! order used for fingerprinting, so reordering fields changes every stored
//! fingerprint.

mod entities;

pub use entities::ALL;
#[cfg(test)]
pub use entities::{ACHATS, PRODUCTS, SALES, STOCK, VENTE_DETAIL};

/// Semantic type of a synchronized field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Short text (VARCHAR(255) at the destination)
    Text,
    /// Unbounded text
    LongText,
    /// Decimal rounded to two places
    Decimal,
    /// Whole number clamped into `[min, max]`
    BoundedInteger { min: i64, max: i64 },
    /// Absolute instant, may be null
    Timestamp,
    /// Two-state flag
    Boolean,
}

impl FieldType {
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Text | FieldType::LongText => "string",
            FieldType::Decimal => "decimal",
            FieldType::BoundedInteger { .. } => "integer",
            FieldType::Timestamp => "timestamp",
            FieldType::Boolean => "boolean",
        }
    }
}

/// One field of an entity schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Destination column name
    pub name: &'static str,
    /// Source column name (matched case-insensitively)
    pub source: &'static str,
    pub field_type: FieldType,
    pub nullable: bool,
    /// Part of the natural key
    pub key: bool,
}

impl FieldDef {
    const fn new(name: &'static str, source: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            source,
            field_type,
            nullable: matches!(field_type, FieldType::Timestamp),
            key: false,
        }
    }

    pub const fn text(name: &'static str, source: &'static str) -> Self {
        Self::new(name, source, FieldType::Text)
    }

    pub const fn long_text(name: &'static str, source: &'static str) -> Self {
        Self::new(name, source, FieldType::LongText)
    }

    pub const fn decimal(name: &'static str, source: &'static str) -> Self {
        Self::new(name, source, FieldType::Decimal)
    }

    pub const fn bounded(name: &'static str, source: &'static str, min: i64, max: i64) -> Self {
        Self::new(name, source, FieldType::BoundedInteger { min, max })
    }

    pub const fn timestamp(name: &'static str, source: &'static str) -> Self {
        Self::new(name, source, FieldType::Timestamp)
    }

    pub const fn boolean(name: &'static str, source: &'static str) -> Self {
        Self::new(name, source, FieldType::Boolean)
    }

    /// Mark this field as part of the natural key
    pub const fn key(self) -> Self {
        Self {
            key: true,
            nullable: false,
            ..self
        }
    }
}

/// Static description of one synchronized entity kind
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    /// Entity kind name used on the command line
    pub name: &'static str,
    pub description: &'static str,
    /// Destination table
    pub table: &'static str,
    /// Source view or table the rows are extracted from
    pub source_relation: &'static str,
    /// Fields in significant order
    pub fields: &'static [FieldDef],
}

impl EntitySchema {
    /// Look up a built-in schema by entity kind name (case-insensitive)
    pub fn find(name: &str) -> Option<&'static EntitySchema> {
        ALL.iter()
            .copied()
            .find(|schema| schema.name.eq_ignore_ascii_case(name))
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.key)
    }

    pub fn value_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.key)
    }

    /// Positions of the key fields within [`EntitySchema::fields`]
    pub fn key_indices(&self) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.key)
            .map(|(i, _)| i)
            .collect()
    }

    #[cfg(test)]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Comma separated key column names, for display
    pub fn key_label(&self) -> String {
        self.key_fields()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check the structural rules the engine relies on
    pub fn validate(&self) -> Result<(), String> {
        if self.fields.is_empty() {
            return Err(format!("{}: schema has no fields", self.name));
        }

        let mut has_key = false;
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(format!("{}: duplicate field '{}'", self.name, field.name));
            }
            if field.name == ROW_HASH_COLUMN {
                return Err(format!(
                    "{}: '{}' is reserved for the fingerprint",
                    self.name, ROW_HASH_COLUMN
                ));
            }
            if field.key {
                has_key = true;
                if field.nullable || !matches!(field.field_type, FieldType::Text) {
                    return Err(format!(
                        "{}: key field '{}' must be non-null text",
                        self.name, field.name
                    ));
                }
            }
        }

        if !has_key {
            return Err(format!("{}: schema declares no natural key", self.name));
        }
        if self.value_fields().next().is_none() {
            return Err(format!("{}: schema has only key fields", self.name));
        }

        Ok(())
    }
}

/// Destination column holding the stored fingerprint
pub const ROW_HASH_COLUMN: &str = "row_hash";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas_are_valid() {
        for schema in ALL {
            schema.validate().unwrap();
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(EntitySchema::find("STOCK"), Some(&STOCK));
        assert_eq!(EntitySchema::find("vente_detail"), Some(&VENTE_DETAIL));
        assert!(EntitySchema::find("unknown").is_none());
    }

    #[test]
    fn test_key_fields() {
        assert_eq!(ACHATS.key_label(), "code_doc");
        assert_eq!(VENTE_DETAIL.key_label(), "num_vente, id_stock");
        assert_eq!(VENTE_DETAIL.key_indices(), vec![0, 5]);
    }

    #[test]
    fn test_validate_rejects_missing_key() {
        static FIELDS: [FieldDef; 2] = [
            FieldDef::text("code", "CODE"),
            FieldDef::decimal("qty", "QTY"),
        ];
        let schema = EntitySchema {
            name: "broken",
            description: "",
            table: "broken",
            source_relation: "broken",
            fields: &FIELDS,
        };
        assert!(schema.validate().unwrap_err().contains("no natural key"));
    }

    #[test]
    fn test_validate_rejects_non_text_key() {
        static FIELDS: [FieldDef; 2] = [
            FieldDef::bounded("id", "ID", 0, 9).key(),
            FieldDef::text("name", "NAME"),
        ];
        let schema = EntitySchema {
            name: "broken",
            description: "",
            table: "broken",
            source_relation: "broken",
            fields: &FIELDS,
        };
        assert!(schema.validate().unwrap_err().contains("non-null text"));
    }

    #[test]
    fn test_timestamps_are_nullable_keys_are_not() {
        let date = STOCK.fields[STOCK.field_index("date_peremption").unwrap()];
        assert!(date.nullable);
        let key = STOCK.fields[STOCK.field_index("id_stock").unwrap()];
        assert!(key.key && !key.nullable);
    }
}
