//! Mapping definition cache
//!
//! The definition is static for the life of a deployment, so it is built once
//! and cached. The cache is injected into the [`FieldMapper`](super::FieldMapper)
//! rather than held in a global, and entries carry tags so a whole family can
//! be invalidated at once.

use super::definition::MappingDefinition;
use crate::domain::{MappingError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Cache key the mapping definition is stored under
pub const MAPPING_CACHE_KEY: &str = "analytics_field_map";

/// Invalidation tag attached to the cached definition
pub const MAPPING_CACHE_TAG: &str = "analytics_field_map";

/// Storage for built mapping definitions
pub trait MappingCache: Send + Sync {
    /// Returns the cached definition for a key, if present
    fn load(&self, key: &str) -> Result<Option<Arc<MappingDefinition>>>;

    /// Stores a definition under a key with invalidation tags
    fn save(&self, key: &str, definition: Arc<MappingDefinition>, tags: &[&str]) -> Result<()>;

    /// Drops every entry carrying `tag`, returning how many were removed
    fn invalidate(&self, tag: &str) -> Result<usize>;
}

struct CacheEntry {
    definition: Arc<MappingDefinition>,
    tags: Vec<String>,
}

/// Process-local mapping cache
///
/// Reads share the lock; a miss takes the write lock once to store the
/// rebuilt definition.
#[derive(Default)]
pub struct InMemoryMappingCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryMappingCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> MappingError {
    MappingError::Cache("mapping cache lock poisoned".to_string())
}

impl MappingCache for InMemoryMappingCache {
    fn load(&self, key: &str) -> Result<Option<Arc<MappingDefinition>>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).map(|entry| entry.definition.clone()))
    }

    fn save(&self, key: &str, definition: Arc<MappingDefinition>, tags: &[&str]) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(
            key.to_string(),
            CacheEntry {
                definition,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        );
        Ok(())
    }

    fn invalidate(&self, tag: &str) -> Result<usize> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        Ok(before - entries.len())
    }
}
