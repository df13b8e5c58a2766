//! Event assembly
//!
//! Turns one store record into one [`NormalizedEvent`]: the record's mapped
//! fields plus the sub-objects its element carries.
//!
//! | element  | nested objects                          |
//! |----------|-----------------------------------------|
//! | order    | line items, `customer`, `visit`, `catalog` |
//! | other    | `catalog`                               |

use crate::adapters::source::{CustomerDirectory, RecordSource, SessionProvider, StoreDirectory};
use crate::core::format::{format_visit, CatalogFormatter, CustomerFormatter, RESOLUTION_FIELDS};
use crate::core::mapping::{ElementKey, FieldMapper};
use crate::domain::{NormalizedEvent, RawRecord, Result, StoreId};
use serde_json::Value;
use std::sync::Arc;

/// Element whose events carry customer, visit and line items
pub const ORDER_ELEMENT: &str = "order";

/// Record field naming the store a record belongs to
pub const STORE_FIELD: &str = "store_id";

pub const CUSTOMER_KEY: &str = "customer";
pub const CATALOG_KEY: &str = "catalog";
pub const VISIT_KEY: &str = "visit";

/// Builds events from store records
pub struct EventAssembler {
    mapper: Arc<FieldMapper>,
    source: Arc<dyn RecordSource>,
    session: Arc<dyn SessionProvider>,
    customers: CustomerFormatter,
    catalogs: CatalogFormatter,
    include_cookies: bool,
}

impl EventAssembler {
    pub fn new(
        mapper: Arc<FieldMapper>,
        source: Arc<dyn RecordSource>,
        stores: Arc<dyn StoreDirectory>,
        customers: Arc<dyn CustomerDirectory>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            customers: CustomerFormatter::new(mapper.clone(), customers, session.clone()),
            catalogs: CatalogFormatter::new(stores),
            mapper,
            source,
            session,
            include_cookies: false,
        }
    }

    /// Attach the session cookie projection to order customers
    pub fn with_cookies(mut self, include: bool) -> Self {
        self.include_cookies = include;
        self
    }

    /// Fields to fetch for an element's records
    ///
    /// The mapped source fields, followed by what customer resolution and the
    /// catalog reference read.
    pub fn attributes_for(&self, element: &str) -> Result<Vec<String>> {
        let mut attributes = self
            .mapper
            .attributes_to_select(&ElementKey::simple(element))?;

        let mut extra: Vec<&str> = Vec::new();
        if element == ORDER_ELEMENT {
            extra.extend(RESOLUTION_FIELDS);
        }
        extra.push(STORE_FIELD);

        for field in extra {
            if !attributes.iter().any(|a| a == field) {
                attributes.push(field.to_string());
            }
        }
        Ok(attributes)
    }

    /// Assemble the event for one record of `element` fetched from `store_id`
    ///
    /// # Errors
    ///
    /// Mapping, formatting and source errors are returned with the element
    /// as origin; a record that cannot be assembled produces no event.
    pub async fn assemble(
        &self,
        element: &str,
        store_id: StoreId,
        record: &RawRecord,
    ) -> Result<NormalizedEvent> {
        self.assemble_inner(element, store_id, record)
            .await
            .map_err(|e| e.with_origin(format!("EventAssembler::assemble({element})")))
    }

    async fn assemble_inner(
        &self,
        element: &str,
        store_id: StoreId,
        record: &RawRecord,
    ) -> Result<NormalizedEvent> {
        let mut event = self.mapper.map_element(&ElementKey::simple(element), record)?;

        if element == ORDER_ELEMENT {
            for sub_element in self.mapper.sub_elements(element)? {
                let items = self.sub_events(element, &sub_element, record).await?;
                event.attach(sub_element, Value::Array(items));
            }

            let customer = self
                .customers
                .format_customer(record, self.include_cookies)
                .await?;
            event.attach(CUSTOMER_KEY, serde_json::to_value(customer)?);

            let visit = format_visit(self.session.as_ref());
            event.attach(VISIT_KEY, serde_json::to_value(visit)?);
        }

        let catalog_id = record
            .numeric_id(STORE_FIELD)
            .map(|id| id.to_string())
            .unwrap_or_else(|| store_id.to_string());
        let catalog = self.catalogs.format_catalog(Some(&catalog_id)).await?;
        event.attach(CATALOG_KEY, serde_json::to_value(catalog)?);

        Ok(event)
    }

    async fn sub_events(
        &self,
        element: &str,
        sub_element: &str,
        parent: &RawRecord,
    ) -> Result<Vec<Value>> {
        let key = ElementKey::composite(element, sub_element);
        let attributes = self.mapper.attributes_to_select(&key)?;
        let rows = self
            .source
            .fetch_sub_records(element, sub_element, parent, &attributes)
            .await?;

        rows.iter()
            .map(|row| Ok(self.mapper.map_element(&key, row)?.to_payload()))
            .collect()
    }
}
