//! Catalog (store) reference formatter

use crate::adapters::source::StoreDirectory;
use crate::domain::{CatalogRef, Result, StoreId};
use std::str::FromStr;
use std::sync::Arc;

/// Builds the catalog reference attached to events
pub struct CatalogFormatter {
    stores: Arc<dyn StoreDirectory>,
}

impl CatalogFormatter {
    pub fn new(stores: Arc<dyn StoreDirectory>) -> Self {
        Self { stores }
    }

    /// Catalog reference for a raw store id
    ///
    /// A missing or non-numeric id yields the empty reference. An unknown
    /// store keeps its id with an empty name.
    ///
    /// # Errors
    ///
    /// Propagates store directory failures.
    pub async fn format_catalog(&self, store_id: Option<&str>) -> Result<CatalogRef> {
        let Some(store_id) = store_id.and_then(|raw| StoreId::from_str(raw).ok()) else {
            return Ok(CatalogRef::empty());
        };

        let name = self
            .stores
            .store_name(store_id)
            .await
            .map_err(|e| e.with_origin("CatalogFormatter::format_catalog"))?
            .unwrap_or_default();

        Ok(CatalogRef {
            id: store_id.to_string(),
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::WebsiteId;

    fn formatter() -> CatalogFormatter {
        let store = InMemoryStore::new().with_store(StoreId::new(42), WebsiteId::new(1), "Main Store");
        CatalogFormatter::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_known_store() {
        let catalog = formatter().format_catalog(Some("42")).await.unwrap();
        assert_eq!(
            catalog,
            CatalogRef {
                id: "42".to_string(),
                name: "Main Store".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_or_invalid_store_id() {
        let formatter = formatter();
        assert!(formatter.format_catalog(None).await.unwrap().is_empty());
        assert!(formatter.format_catalog(Some("")).await.unwrap().is_empty());
        assert!(formatter
            .format_catalog(Some("default"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_store_keeps_id() {
        let catalog = formatter().format_catalog(Some("7")).await.unwrap();
        assert_eq!(catalog.id, "7");
        assert_eq!(catalog.name, "");
    }
}
