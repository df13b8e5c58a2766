//! Value coercion per field type
//!
//! Numeric and boolean coercion is total: anything that does not read as a
//! number becomes zero. Only datetime coercion can fail, and an empty
//! datetime stays empty.

use super::definition::FieldType;
use crate::core::format::format_date;
use crate::domain::{FieldValue, Result};

/// Coerces a stringified raw value to the given field type
pub fn coerce(raw: &str, field_type: FieldType) -> Result<FieldValue> {
    match field_type {
        FieldType::String => Ok(FieldValue::String(raw.to_string())),
        FieldType::Int => Ok(FieldValue::Int(coerce_int(raw))),
        FieldType::Float => Ok(FieldValue::Float(coerce_float(raw))),
        FieldType::Bool => Ok(FieldValue::Bool(coerce_bool(raw))),
        FieldType::DateTime if raw.trim().is_empty() => Ok(FieldValue::String(String::new())),
        FieldType::DateTime => format_date(raw).map(FieldValue::String),
    }
}

/// Leading-number float parse; `"12.5kg"` is 12.5, `"abc"` is 0
pub fn coerce_float(raw: &str) -> f64 {
    let prefix = numeric_prefix(raw);
    prefix
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Leading-number integer parse, truncating any fraction
pub fn coerce_int(raw: &str) -> i64 {
    let prefix = numeric_prefix(raw);
    if let Ok(value) = prefix.parse::<i64>() {
        return value;
    }
    match prefix.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() < i64::MAX as f64 => value.trunc() as i64,
        _ => 0,
    }
}

/// Only `""` and `"0"` are false
pub fn coerce_bool(raw: &str) -> bool {
    !(raw.is_empty() || raw == "0")
}

/// Longest prefix of `raw` (after leading whitespace) that reads as a
/// decimal number with optional sign, fraction and exponent
fn numeric_prefix(raw: &str) -> &str {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return "";
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    &s[..end]
}
