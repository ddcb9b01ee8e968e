//! Normalizer: raw source rows to canonical records
//!
//! Normalization never fails. Source systems are not schema-guaranteed, so a
//! malformed value degrades to its type's default instead of aborting the run:
//!
//! - numbers: missing or non-numeric → 0, then rounded to two decimals
//! - text: missing → empty string, always trimmed
//! - timestamps: missing or unparseable → null
//! - bounded integers: truncated, then clamped into range
//!
//! Text that starts with a number keeps its numeric prefix (`"12.5 kg"` is
//! 12.5), which is how the source application itself reads such values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::schema::{EntitySchema, FieldDef, FieldType};
use crate::source::{RawRecord, RawValue};

use super::record::CanonicalRecord;
use super::value::Value;

/// Normalize one raw row into a canonical record of `schema`
pub fn normalize(schema: &'static EntitySchema, raw: &RawRecord) -> CanonicalRecord {
    let values = schema
        .fields
        .iter()
        .map(|field| normalize_field(field, raw.get(field.source)))
        .collect();
    CanonicalRecord::from_values(schema, values)
}

/// Normalize a single value according to its field definition
pub fn normalize_field(field: &FieldDef, raw: &RawValue) -> Value {
    match field.field_type {
        FieldType::Text | FieldType::LongText => Value::String(coerce_text(raw)),
        FieldType::Decimal => {
            let parsed = parse_decimal(raw);
            if parsed.is_none() && !matches!(raw, RawValue::Null) {
                log::trace!("{}: non-numeric value {:?} coerced to 0", field.name, raw);
            }
            Value::Decimal(parsed.map(round2).unwrap_or(0.0))
        }
        FieldType::BoundedInteger { min, max } => {
            Value::Int(coerce_integer(field, raw).clamp(min, max))
        }
        FieldType::Timestamp => Value::Timestamp(coerce_timestamp(raw)),
        FieldType::Boolean => Value::Bool(coerce_bool(raw)),
    }
}

pub fn coerce_text(raw: &RawValue) -> String {
    match raw {
        RawValue::Null => String::new(),
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Int(i) => i.to_string(),
        RawValue::Float(f) if f.is_finite() && *f == f.trunc() && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        RawValue::Float(f) => f.to_string(),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

fn parse_decimal(raw: &RawValue) -> Option<f64> {
    let value = match raw {
        RawValue::Text(s) => parse_float_prefix(s)?,
        RawValue::Int(i) => *i as f64,
        RawValue::Float(f) => *f,
        RawValue::Null | RawValue::Bool(_) | RawValue::Timestamp(_) => return None,
    };
    value.is_finite().then_some(value)
}

fn coerce_integer(field: &FieldDef, raw: &RawValue) -> i64 {
    let parsed = match raw {
        RawValue::Text(s) => parse_int_prefix(s),
        RawValue::Int(i) => Some(*i),
        // saturating cast, truncates toward zero
        RawValue::Float(f) if f.is_finite() => Some(*f as i64),
        _ => None,
    };
    if parsed.is_none() && !matches!(raw, RawValue::Null) {
        log::trace!("{}: non-integer value {:?} coerced to 0", field.name, raw);
    }
    parsed.unwrap_or(0)
}

pub fn coerce_bool(raw: &RawValue) -> bool {
    match raw {
        RawValue::Null => false,
        RawValue::Bool(b) => *b,
        RawValue::Int(i) => *i != 0,
        RawValue::Float(f) => *f != 0.0 && !f.is_nan(),
        RawValue::Timestamp(_) => true,
        RawValue::Text(s) => {
            let s = s.trim().to_ascii_lowercase();
            match s.as_str() {
                "" | "0" | "false" | "f" | "no" | "n" | "off" => false,
                "1" | "true" | "t" | "yes" | "y" | "on" => true,
                other => other.parse::<f64>().map(|f| f != 0.0).unwrap_or(true),
            }
        }
    }
}

pub fn coerce_timestamp(raw: &RawValue) -> Option<DateTime<Utc>> {
    match raw {
        RawValue::Timestamp(ts) => Some(*ts),
        RawValue::Text(s) => parse_timestamp(s.trim()),
        // epoch milliseconds
        RawValue::Int(ms) => DateTime::from_timestamp_millis(*ms),
        RawValue::Float(ms) if ms.is_finite() => DateTime::from_timestamp_millis(*ms as i64),
        _ => None,
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a timestamp; naive values are read as UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Round to two decimals the way the stored fingerprints were produced:
/// exact half-cent ties round away from zero, everything else rounds to the
/// nearest cent of the exact binary value. Negative zero becomes zero.
pub fn round2(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    let magnitude = x.abs();
    let eighths = magnitude * 8.0;
    let rounded = if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        (magnitude * 100.0).ceil() / 100.0
    } else {
        format!("{:.2}", magnitude).parse::<f64>().unwrap_or(0.0)
    };
    let signed = if x.is_sign_negative() { -rounded } else { rounded };
    if signed == 0.0 { 0.0 } else { signed }
}

/// Longest leading decimal literal of `s`, ignoring leading whitespace
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - end - 1;
        if digits + frac_digits > 0 {
            digits += frac_digits;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Longest leading integer literal of `s`, ignoring leading whitespace
fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    let literal = &s[..end];
    literal.parse::<i64>().ok().or_else(|| {
        // out of i64 range: saturate
        Some(if literal.starts_with('-') { i64::MIN } else { i64::MAX })
    })
}
