//! Canonical field values

use chrono::{DateTime, SecondsFormat, Utc};

/// A normalized field value.
///
/// Every variant is typed, including the null timestamp, so a batch column
/// always binds with a single SQL type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Trimmed text
    String(String),
    /// Whole number
    Int(i64),
    /// Decimal rounded to two places
    Decimal(f64),
    /// Boolean flag
    Bool(bool),
    /// Absolute instant or explicit null
    Timestamp(Option<DateTime<Utc>>),
}

impl Value {
    /// JSON text used inside the fingerprint payload.
    ///
    /// Decimals are JSON numbers with no trailing `.0` for whole values and
    /// timestamps are ISO-8601 UTC with millisecond precision, matching the
    /// encoding of fingerprints already stored at the destination.
    pub fn fingerprint_json(&self) -> String {
        match self {
            Value::String(s) => serde_json::Value::from(s.as_str()).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Decimal(f) => decimal_json(*f),
            Value::Bool(b) => b.to_string(),
            Value::Timestamp(Some(ts)) => {
                serde_json::Value::from(ts.to_rfc3339_opts(SecondsFormat::Millis, true)).to_string()
            }
            Value::Timestamp(None) => "null".to_string(),
        }
    }
}

/// Whole numbers below this magnitude are written out in plain digits
const MAX_PLAIN_INTEGRAL: f64 = 1e21;

fn decimal_json(f: f64) -> String {
    if !f.is_finite() {
        return "null".to_string();
    }
    if f == 0.0 {
        // folds -0.0 into 0
        return "0".to_string();
    }
    if f == f.trunc() && f.abs() < MAX_PLAIN_INTEGRAL {
        // shortest round-trip digits padded with zeros, never an exponent
        return format!("{}", f);
    }
    let text = serde_json::Number::from_f64(f)
        .map(|n| n.to_string())
        .unwrap_or_else(|| "null".to_string());
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => text,
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{:.2}", d),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Timestamp(Some(ts)) => write!(f, "{}", ts.to_rfc3339()),
            Value::Timestamp(None) => write!(f, "(null)"),
        }
    }
}
