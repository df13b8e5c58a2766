//! Field mapper
//!
//! Translates raw store records into [`NormalizedEvent`]s using the cached
//! mapping definition.

use super::cache::{MappingCache, MAPPING_CACHE_KEY, MAPPING_CACHE_TAG};
use super::coerce::coerce;
use super::definition::{ElementKey, MappingDefinition};
use super::source::MappingSource;
use crate::domain::{MappedField, MappingError, NormalizedEvent, RawRecord, Result};
use std::sync::Arc;

/// Maps store records through the mapping definition
///
/// # Example
///
/// ```
/// use storefeed::core::mapping::{ElementKey, FieldMapper, InMemoryMappingCache, InlineMappingSource};
/// use storefeed::domain::{FieldValue, RawRecord};
/// use std::sync::Arc;
///
/// let source = InlineMappingSource::new(r#"{"elements": {"order": [
///     {"local_key": "total", "source": "grand_total", "api": "totalAmount", "type": "float", "default": "0"}
/// ]}}"#);
/// let mapper = FieldMapper::new(Arc::new(source), Arc::new(InMemoryMappingCache::new()));
///
/// let record = RawRecord::new().with("grand_total", "");
/// let event = mapper.map_element(&ElementKey::simple("order"), &record).unwrap();
///
/// let total = event.field("total").unwrap();
/// assert_eq!(total.api, "totalAmount");
/// assert_eq!(total.value, FieldValue::Float(0.0));
/// ```
pub struct FieldMapper {
    source: Arc<dyn MappingSource>,
    cache: Arc<dyn MappingCache>,
}

impl FieldMapper {
    /// Create a mapper over a definition source and a cache
    pub fn new(source: Arc<dyn MappingSource>, cache: Arc<dyn MappingCache>) -> Self {
        Self { source, cache }
    }

    /// Returns the mapping definition, rebuilding it on a cache miss
    ///
    /// # Errors
    ///
    /// Returns a mapping error if the cache fails or the source cannot be
    /// read or parsed.
    pub fn definition(&self) -> Result<Arc<MappingDefinition>> {
        if let Some(definition) = self.cache.load(MAPPING_CACHE_KEY)? {
            return Ok(definition);
        }

        let text = self.source.load()?;
        let definition = Arc::new(MappingDefinition::from_json(&text)?);

        tracing::debug!(
            source = %self.source.describe(),
            fingerprint = %definition.fingerprint(),
            "Rebuilt field mapping definition"
        );

        self.cache
            .save(MAPPING_CACHE_KEY, definition.clone(), &[MAPPING_CACHE_TAG])?;
        Ok(definition)
    }

    /// Maps one record for an element
    ///
    /// The result has one field per definition entry of `element`. Empty or
    /// missing source values take the entry's default before coercion.
    ///
    /// # Errors
    ///
    /// Returns a mapping error if the definition is unavailable, or a
    /// formatting error if a datetime value cannot be parsed. No partial
    /// event is returned.
    pub fn map_element(&self, element: &ElementKey, record: &RawRecord) -> Result<NormalizedEvent> {
        let definition = self
            .definition()
            .map_err(|e| e.with_origin("FieldMapper::map_element"))?;

        let mut event = NormalizedEvent::new(element.to_string());
        for entry in definition.entries(element) {
            let mut raw = record.get_string(entry.source.field());
            if raw.is_empty() {
                raw = entry.default.clone();
            }

            let value = coerce(&raw, entry.field_type).map_err(|e| {
                e.with_origin(format!(
                    "FieldMapper::map_element({element}.{})",
                    entry.local_key
                ))
            })?;
            event.insert_field(&entry.local_key, MappedField::new(&entry.api, value));
        }

        Ok(event)
    }

    /// Source fields a record fetch must select for an element key
    ///
    /// `Simple("order")` yields the order's own columns; `Composite("order",
    /// "items")` yields the line-item columns.
    pub fn attributes_to_select(&self, element: &ElementKey) -> Result<Vec<String>> {
        let definition = self
            .definition()
            .map_err(|e| e.with_origin("FieldMapper::attributes_to_select"))?;
        Ok(definition.attributes(element))
    }

    /// Sub-elements (e.g. "items") mapped under an element
    pub fn sub_elements(&self, element: &str) -> Result<Vec<String>> {
        let definition = self
            .definition()
            .map_err(|e| e.with_origin("FieldMapper::sub_elements"))?;
        Ok(definition.sub_elements(element))
    }

    /// Verifies an element is defined
    pub fn require_element(&self, element: &str) -> Result<()> {
        let definition = self.definition()?;
        if definition.has_element(element) {
            Ok(())
        } else {
            Err(MappingError::InvalidDefinition(format!(
                "element '{element}' is not defined in the mapping"
            ))
            .into())
        }
    }

    /// Drops the cached definition so the next call rebuilds it
    pub fn invalidate(&self) -> Result<()> {
        let removed = self.cache.invalidate(MAPPING_CACHE_TAG)?;
        tracing::info!(removed, "Invalidated field mapping cache");
        Ok(())
    }
}
