//! Raw store records
//!
//! A [`RawRecord`] is a row handed over by the host platform: a flat map of
//! column name to JSON value. Nothing about its shape is guaranteed, so every
//! accessor here is total.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw record fetched from the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Creates an empty record
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds a record from a JSON value
    ///
    /// Returns `None` if the value is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the raw value of a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Sets a field, returning the record for chaining
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Sets a field
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Returns a field as a string; missing fields are empty
    pub fn get_string(&self, field: &str) -> String {
        self.get(field).map(stringify).unwrap_or_default()
    }

    /// Returns true if the field is present and its string form is non-empty
    pub fn has_value(&self, field: &str) -> bool {
        !self.get_string(field).is_empty()
    }

    /// Returns the field as a numeric identifier if it is one
    pub fn numeric_id(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(numeric_id)
    }

    /// Number of fields in the record
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// String form of a raw value
///
/// `null` and `false` are empty, `true` is `"1"`; compound values use their
/// JSON text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Parses a raw value as a non-negative integer identifier
pub fn numeric_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}
