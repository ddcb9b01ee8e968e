//! Record fingerprints
//!
//! A fingerprint is the SHA-256 of a JSON array holding the record's values in
//! schema order (see [`Value::fingerprint_json`]). Nothing run-dependent
//! enters the payload, so unchanged input hashes identically across runs and
//! process restarts.

use std::fmt;

use sha2::{Digest, Sha256};

use super::record::CanonicalRecord;
use super::value::Value;

/// Length of a hex encoded fingerprint
pub const FINGERPRINT_LEN: usize = 64;

/// Lowercase hex SHA-256 digest of a canonical record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(record: &CanonicalRecord) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical_payload(record).as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    /// Wrap a fingerprint read back from the destination
    pub fn from_stored(value: impl Into<String>) -> Self {
        Fingerprint(value.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The exact text that gets hashed for `record`
pub fn canonical_payload(record: &CanonicalRecord) -> String {
    let values: Vec<String> = record
        .values()
        .iter()
        .map(Value::fingerprint_json)
        .collect();
    format!("[{}]", values.join(","))
}
