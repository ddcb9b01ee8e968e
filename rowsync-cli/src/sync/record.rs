//! Canonical records and their identity

use std::fmt;

use crate::schema::EntitySchema;

use super::fingerprint::Fingerprint;
use super::value::Value;

/// Natural key of a record: the key field values in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NaturalKey(Vec<String>);

impl NaturalKey {
    pub fn new(parts: Vec<String>) -> Self {
        NaturalKey(parts)
    }

    /// Single-column key
    #[cfg(test)]
    pub fn single(part: impl Into<String>) -> Self {
        NaturalKey(vec![part.into()])
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("|"))
    }
}

/// A fully normalized record of one entity kind
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    schema: &'static EntitySchema,
    values: Vec<Value>,
}

impl CanonicalRecord {
    /// Build a record from values given in schema field order.
    ///
    /// Callers outside the normalizer are tests and fixtures; the value count
    /// must match the schema.
    pub fn from_values(schema: &'static EntitySchema, values: Vec<Value>) -> Self {
        debug_assert_eq!(schema.fields.len(), values.len());
        CanonicalRecord { schema, values }
    }

    /// Values in significant (declaration) order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema.field_index(field).map(|i| &self.values[i])
    }

    /// Replace one field value, keeping the schema order
    #[cfg(test)]
    pub fn with_value(mut self, field: &str, value: Value) -> Self {
        if let Some(i) = self.schema.field_index(field) {
            self.values[i] = value;
        }
        self
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey(
            self.schema
                .key_indices()
                .into_iter()
                .map(|i| match &self.values[i] {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }
}

/// A canonical record paired with its key and fingerprint, ready for diffing
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRecord {
    pub key: NaturalKey,
    pub fingerprint: Fingerprint,
    pub record: CanonicalRecord,
}

impl SyncRecord {
    pub fn new(record: CanonicalRecord) -> Self {
        SyncRecord {
            key: record.natural_key(),
            fingerprint: Fingerprint::of(&record),
            record,
        }
    }
}
