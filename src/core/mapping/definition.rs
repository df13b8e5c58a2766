//! Mapping definition model
//!
//! The mapping definition is the declarative table that says, per element,
//! which store field feeds which API field, as what type, and with what
//! default. Source references to nested line-item data are written
//! `"items|sku"` in the definition file; they are parsed into
//! [`SourceField::Composite`] once, at load time.

use crate::domain::record::stringify;
use crate::domain::MappingError;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

const COMPOSITE_SEPARATOR: char = '|';

/// Target type of a mapped field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    DateTime,
}

impl FieldType {
    /// Resolves a type name from a definition file
    ///
    /// Unknown names resolve to [`FieldType::String`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "int" | "integer" => FieldType::Int,
            "float" | "decimal" | "double" => FieldType::Float,
            "bool" | "boolean" => FieldType::Bool,
            "datetime" | "date" => FieldType::DateTime,
            "string" | "" => FieldType::String,
            other => {
                tracing::warn!(field_type = %other, "Unknown mapping field type, using string");
                FieldType::String
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "boolean",
            FieldType::DateTime => "datetime",
        };
        write!(f, "{name}")
    }
}

/// Where a mapped value is read from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceField {
    /// A field on the element's own record
    Simple(String),
    /// A field on a nested sub-element record (e.g. an order line item)
    Composite { sub_element: String, field: String },
}

impl SourceField {
    /// Parses a source reference (`"sku"` or `"items|sku"`)
    pub fn parse(input: &str) -> Result<Self, String> {
        let parts: Vec<&str> = input.split(COMPOSITE_SEPARATOR).map(str::trim).collect();
        match parts.as_slice() {
            [field] if !field.is_empty() => Ok(SourceField::Simple((*field).to_string())),
            [sub_element, field] if !sub_element.is_empty() && !field.is_empty() => {
                Ok(SourceField::Composite {
                    sub_element: (*sub_element).to_string(),
                    field: (*field).to_string(),
                })
            }
            _ => Err(format!("malformed source reference '{input}'")),
        }
    }

    /// The record field name to read
    pub fn field(&self) -> &str {
        match self {
            SourceField::Simple(field) => field,
            SourceField::Composite { field, .. } => field,
        }
    }

    /// The sub-element this field belongs to, if any
    pub fn sub_element(&self) -> Option<&str> {
        match self {
            SourceField::Simple(_) => None,
            SourceField::Composite { sub_element, .. } => Some(sub_element),
        }
    }
}

/// Identifies which entries of the definition to use
///
/// # Examples
///
/// ```
/// use storefeed::core::mapping::ElementKey;
/// use std::str::FromStr;
///
/// let key = ElementKey::from_str("order|items").unwrap();
/// assert_eq!(key.element(), "order");
/// assert_eq!(key.sub_element(), Some("items"));
/// assert_eq!(key.to_string(), "order|items");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Simple(String),
    Composite(String, String),
}

impl ElementKey {
    /// Key for an element's own fields
    pub fn simple(element: impl Into<String>) -> Self {
        ElementKey::Simple(element.into())
    }

    /// Key for a sub-element's fields
    pub fn composite(element: impl Into<String>, sub_element: impl Into<String>) -> Self {
        ElementKey::Composite(element.into(), sub_element.into())
    }

    /// The top-level element name
    pub fn element(&self) -> &str {
        match self {
            ElementKey::Simple(element) => element,
            ElementKey::Composite(element, _) => element,
        }
    }

    /// The sub-element name, if any
    pub fn sub_element(&self) -> Option<&str> {
        match self {
            ElementKey::Simple(_) => None,
            ElementKey::Composite(_, sub) => Some(sub),
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKey::Simple(element) => write!(f, "{element}"),
            ElementKey::Composite(element, sub) => {
                write!(f, "{element}{COMPOSITE_SEPARATOR}{sub}")
            }
        }
    }
}

impl FromStr for ElementKey {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match SourceField::parse(s) {
            Ok(SourceField::Simple(element)) => Ok(ElementKey::Simple(element)),
            Ok(SourceField::Composite { sub_element, field }) => {
                Ok(ElementKey::Composite(sub_element, field))
            }
            Err(_) => Err(MappingError::InvalidElementKey(s.to_string())),
        }
    }
}

/// One row of the mapping table
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub local_key: String,
    pub source: SourceField,
    pub api: String,
    pub field_type: FieldType,
    pub default: String,
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    elements: BTreeMap<String, Vec<RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    local_key: String,
    source: String,
    api: String,
    #[serde(rename = "type", default)]
    field_type: String,
    #[serde(default)]
    default: serde_json::Value,
}

/// The loaded, validated mapping table
#[derive(Debug, Clone, PartialEq)]
pub struct MappingDefinition {
    elements: BTreeMap<String, Vec<MappingEntry>>,
    fingerprint: String,
}

impl MappingDefinition {
    /// Parses and validates a JSON mapping definition
    ///
    /// # Errors
    ///
    /// Returns a [`MappingError`] if the JSON is malformed, a source
    /// reference is invalid, an API name is empty, or a local key repeats
    /// within the same element and sub-element.
    pub fn from_json(source: &str) -> Result<Self, MappingError> {
        let raw: RawDefinition = serde_json::from_str(source)
            .map_err(|e| MappingError::InvalidDefinition(e.to_string()))?;

        let mut elements = BTreeMap::new();
        for (element, raw_entries) in raw.elements {
            if element.trim().is_empty() || element.contains(COMPOSITE_SEPARATOR) {
                return Err(MappingError::InvalidDefinition(format!(
                    "invalid element name '{element}'"
                )));
            }

            let mut seen = HashSet::new();
            let mut entries = Vec::with_capacity(raw_entries.len());
            for raw_entry in raw_entries {
                let source = SourceField::parse(&raw_entry.source).map_err(|_| {
                    MappingError::InvalidSourceField {
                        element: element.clone(),
                        local_key: raw_entry.local_key.clone(),
                        source_field: raw_entry.source.clone(),
                    }
                })?;

                if raw_entry.api.trim().is_empty() {
                    return Err(MappingError::InvalidDefinition(format!(
                        "{element}.{} has an empty api field",
                        raw_entry.local_key
                    )));
                }

                let scope = source.sub_element().map(str::to_string);
                if !seen.insert((scope, raw_entry.local_key.clone())) {
                    return Err(MappingError::InvalidDefinition(format!(
                        "duplicate local key '{}' in element '{element}'",
                        raw_entry.local_key
                    )));
                }

                entries.push(MappingEntry {
                    local_key: raw_entry.local_key,
                    source,
                    api: raw_entry.api,
                    field_type: FieldType::from_name(&raw_entry.field_type),
                    default: stringify(&raw_entry.default),
                });
            }
            elements.insert(element, entries);
        }

        Ok(Self {
            elements,
            fingerprint: fingerprint(source),
        })
    }

    /// Entries for an element key, in definition order
    pub fn entries<'a>(&'a self, key: &'a ElementKey) -> impl Iterator<Item = &'a MappingEntry> {
        self.elements
            .get(key.element())
            .into_iter()
            .flatten()
            .filter(move |entry| entry.source.sub_element() == key.sub_element())
    }

    /// Distinct source field names for an element key, in definition order
    pub fn attributes(&self, key: &ElementKey) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries(key)
            .map(|entry| entry.source.field().to_string())
            .filter(|field| seen.insert(field.clone()))
            .collect()
    }

    /// Distinct sub-elements referenced by an element's entries
    pub fn sub_elements(&self, element: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.elements
            .get(element)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.source.sub_element())
            .filter(|sub| seen.insert(sub.to_string()))
            .map(str::to_string)
            .collect()
    }

    /// Whether an element is defined
    pub fn has_element(&self, element: &str) -> bool {
        self.elements.contains_key(element)
    }

    /// SHA-256 of the definition source, hex encoded
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"{
        "elements": {
            "order": [
                {"local_key": "order_id", "source": "increment_id", "api": "orderId", "type": "string", "default": ""},
                {"local_key": "total", "source": "grand_total", "api": "totalAmount", "type": "float", "default": "0"},
                {"local_key": "sku", "source": "items|sku", "api": "sku", "type": "string", "default": ""},
                {"local_key": "qty", "source": "items|qty_ordered", "api": "quantity", "type": "int", "default": 0}
            ]
        }
    }"#;

    #[test]
    fn test_source_field_parse() {
        assert_eq!(
            SourceField::parse("sku").unwrap(),
            SourceField::Simple("sku".to_string())
        );
        assert_eq!(
            SourceField::parse("items|sku").unwrap(),
            SourceField::Composite {
                sub_element: "items".to_string(),
                field: "sku".to_string()
            }
        );
        assert!(SourceField::parse("").is_err());
        assert!(SourceField::parse("items|").is_err());
        assert!(SourceField::parse("|sku").is_err());
        assert!(SourceField::parse("a|b|c").is_err());
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::from_name("float"), FieldType::Float);
        assert_eq!(FieldType::from_name("INT"), FieldType::Int);
        assert_eq!(FieldType::from_name("boolean"), FieldType::Bool);
        assert_eq!(FieldType::from_name("datetime"), FieldType::DateTime);
        assert_eq!(FieldType::from_name("currency"), FieldType::String);
    }

    #[test]
    fn test_entries_split_by_sub_element() {
        let definition = MappingDefinition::from_json(DEFINITION).unwrap();

        let order_key = ElementKey::simple("order");
        let order: Vec<_> = definition
            .entries(&order_key)
            .map(|e| e.local_key.as_str())
            .collect();
        assert_eq!(order, vec!["order_id", "total"]);

        let items_key = ElementKey::composite("order", "items");
        let items: Vec<_> = definition
            .entries(&items_key)
            .map(|e| e.local_key.as_str())
            .collect();
        assert_eq!(items, vec!["sku", "qty"]);

        assert_eq!(definition.entries(&ElementKey::simple("cart")).count(), 0);
    }

    #[test]
    fn test_numeric_default_is_stringified() {
        let definition = MappingDefinition::from_json(DEFINITION).unwrap();
        let items_key = ElementKey::composite("order", "items");
        let qty = definition
            .entries(&items_key)
            .find(|e| e.local_key == "qty")
            .unwrap();
        assert_eq!(qty.default, "0");
    }

    #[test]
    fn test_attributes() {
        let definition = MappingDefinition::from_json(DEFINITION).unwrap();
        assert_eq!(
            definition.attributes(&ElementKey::simple("order")),
            vec!["increment_id", "grand_total"]
        );
        assert_eq!(
            definition.attributes(&ElementKey::composite("order", "items")),
            vec!["sku", "qty_ordered"]
        );
        assert_eq!(definition.sub_elements("order"), vec!["items"]);
        assert!(definition.sub_elements("product").is_empty());
    }

    #[test]
    fn test_invalid_source_rejected_at_load() {
        let json = r#"{"elements": {"order": [
            {"local_key": "x", "source": "a|b|c", "api": "x", "type": "string"}
        ]}}"#;
        let err = MappingDefinition::from_json(json).unwrap_err();
        assert!(matches!(err, MappingError::InvalidSourceField { .. }));
    }

    #[test]
    fn test_duplicate_local_key_rejected() {
        let json = r#"{"elements": {"order": [
            {"local_key": "x", "source": "a", "api": "x"},
            {"local_key": "x", "source": "b", "api": "y"}
        ]}}"#;
        assert!(MappingDefinition::from_json(json).is_err());
    }

    #[test]
    fn test_same_local_key_allowed_across_sub_elements() {
        let json = r#"{"elements": {"order": [
            {"local_key": "id", "source": "entity_id", "api": "id"},
            {"local_key": "id", "source": "items|item_id", "api": "id"}
        ]}}"#;
        assert!(MappingDefinition::from_json(json).is_ok());
    }

    #[test]
    fn test_malformed_json() {
        let err = MappingDefinition::from_json("{not json").unwrap_err();
        assert!(matches!(err, MappingError::InvalidDefinition(_)));
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = MappingDefinition::from_json(DEFINITION).unwrap();
        let b = MappingDefinition::from_json(DEFINITION).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_element_key_parse() {
        assert_eq!(
            ElementKey::from_str("customer").unwrap(),
            ElementKey::simple("customer")
        );
        assert!(ElementKey::from_str("order|").is_err());
    }
}
