//! Normalized events
//!
//! A [`NormalizedEvent`] is the vendor-neutral result of mapping one store
//! record: local keys pointing at `{api, value}` pairs, plus any nested
//! sub-objects (customer, catalog, visit, line items). Local keys never reach
//! the wire; [`NormalizedEvent::to_payload`] emits only API names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A coerced field value
///
/// Datetimes are carried as ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl FieldValue {
    /// Returns the value as a string slice if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value into its JSON form
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::String(s) => Value::String(s.clone()),
        }
    }
}

/// One mapped field: the API name it is sent under and its coerced value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedField {
    pub api: String,
    pub value: FieldValue,
}

impl MappedField {
    pub fn new(api: impl Into<String>, value: FieldValue) -> Self {
        Self {
            api: api.into(),
            value,
        }
    }
}

/// A store record translated into the analytics event model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Element the event was mapped from (e.g. "order")
    pub element: String,

    /// Mapped fields keyed by local key
    pub fields: BTreeMap<String, MappedField>,

    /// Nested sub-objects keyed by their wire name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nested: BTreeMap<String, Value>,
}

impl NormalizedEvent {
    /// Creates an empty event for an element
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            fields: BTreeMap::new(),
            nested: BTreeMap::new(),
        }
    }

    /// Inserts a mapped field under its local key
    pub fn insert_field(&mut self, local_key: impl Into<String>, field: MappedField) {
        self.fields.insert(local_key.into(), field);
    }

    /// Looks up a mapped field by local key
    pub fn field(&self, local_key: &str) -> Option<&MappedField> {
        self.fields.get(local_key)
    }

    /// Attaches a nested sub-object under a wire key
    pub fn attach(&mut self, key: impl Into<String>, value: Value) {
        self.nested.insert(key.into(), value);
    }

    /// Number of mapped fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the event has no mapped fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds the wire object: `{api_field: value, ..., nested_key: object}`
    pub fn to_payload(&self) -> Value {
        let mut object = Map::new();
        for field in self.fields.values() {
            object.insert(field.api.clone(), field.value.to_json());
        }
        for (key, value) in &self.nested {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}
