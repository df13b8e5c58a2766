//! In-memory store data and sessions
//!
//! [`InMemoryStore`] stands in for the host platform's records, stores and
//! customers; [`StaticSession`] for a visitor session.

use crate::adapters::source::{
    CustomerDirectory, RecordSource, SessionProvider, StoreDirectory, VisitorSession,
};
use crate::domain::{RawRecord, Result, StoreId, WebsiteId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

/// Field holding a record's primary key
pub const ENTITY_ID_FIELD: &str = "entity_id";

#[derive(Debug, Clone)]
struct StoreRow {
    website_id: WebsiteId,
    name: String,
}

/// Fixture-backed record source, store directory and customer directory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    stores: BTreeMap<StoreId, StoreRow>,
    records: HashMap<(String, StoreId), Vec<RawRecord>>,
    sub_records: HashMap<(String, String, String), Vec<RawRecord>>,
    customers: BTreeMap<u64, RawRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under a website
    pub fn with_store(mut self, store_id: StoreId, website_id: WebsiteId, name: &str) -> Self {
        self.stores.insert(
            store_id,
            StoreRow {
                website_id,
                name: name.to_string(),
            },
        );
        self
    }

    /// Append records of an element for a store
    pub fn with_records(mut self, element: &str, store_id: StoreId, records: Vec<RawRecord>) -> Self {
        self.records
            .entry((element.to_string(), store_id))
            .or_default()
            .extend(records);
        self
    }

    /// Append sub-element records under the parent with `entity_id == parent_id`
    pub fn with_sub_records(
        mut self,
        element: &str,
        sub_element: &str,
        parent_id: &str,
        records: Vec<RawRecord>,
    ) -> Self {
        self.sub_records
            .entry((
                element.to_string(),
                sub_element.to_string(),
                parent_id.to_string(),
            ))
            .or_default()
            .extend(records);
        self
    }

    /// Register a customer row, keyed by its numeric `entity_id`
    pub fn with_customer(mut self, row: RawRecord) -> Self {
        if let Some(id) = row.numeric_id(ENTITY_ID_FIELD) {
            self.customers.insert(id, row);
        }
        self
    }
}

#[async_trait]
impl RecordSource for InMemoryStore {
    async fn fetch_records(
        &self,
        element: &str,
        store_id: StoreId,
        _attributes: &[String],
    ) -> Result<Vec<RawRecord>> {
        Ok(self
            .records
            .get(&(element.to_string(), store_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_sub_records(
        &self,
        element: &str,
        sub_element: &str,
        parent: &RawRecord,
        _attributes: &[String],
    ) -> Result<Vec<RawRecord>> {
        let key = (
            element.to_string(),
            sub_element.to_string(),
            parent.get_string(ENTITY_ID_FIELD),
        );
        Ok(self.sub_records.get(&key).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl StoreDirectory for InMemoryStore {
    async fn website_for_store(&self, store_id: StoreId) -> Result<Option<WebsiteId>> {
        Ok(self.stores.get(&store_id).map(|s| s.website_id))
    }

    async fn store_ids(&self, website_id: WebsiteId) -> Result<Vec<StoreId>> {
        Ok(self
            .stores
            .iter()
            .filter(|(_, s)| s.website_id == website_id)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn store_name(&self, store_id: StoreId) -> Result<Option<String>> {
        Ok(self.stores.get(&store_id).map(|s| s.name.clone()))
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryStore {
    async fn load_customer(
        &self,
        customer_id: u64,
        _attributes: &[String],
    ) -> Result<Option<RawRecord>> {
        Ok(self.customers.get(&customer_id).cloned())
    }
}

/// A fixed visitor session
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    cookies: HashMap<String, String>,
    customer_id: Option<u64>,
    visitor: Option<VisitorSession>,
}

impl StaticSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.insert(name.to_string(), value.into());
        self
    }

    pub fn with_customer_id(mut self, customer_id: u64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_visitor(mut self, visitor: VisitorSession) -> Self {
        self.visitor = Some(visitor);
        self
    }
}

impl SessionProvider for StaticSession {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn logged_in_customer_id(&self) -> Option<u64> {
        self.customer_id
    }

    fn visitor(&self) -> Option<VisitorSession> {
        self.visitor.clone()
    }
}
