//! Host platform collaborator traits
//!
//! The store platform's persistence and session layers are outside this
//! crate. These traits are the seams the pipeline reads them through.

use crate::domain::{RawRecord, Result, StoreId, WebsiteId};
use async_trait::async_trait;

/// Provider of raw store records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every record of `element` belonging to a store
    ///
    /// `attributes` lists the fields the caller needs. Implementations may
    /// return more; fields they do not have are simply absent. Records come
    /// back in a stable order (ascending primary key).
    ///
    /// # Errors
    ///
    /// Returns an error if the element is unknown to the source or the fetch
    /// fails.
    async fn fetch_records(
        &self,
        element: &str,
        store_id: StoreId,
        attributes: &[String],
    ) -> Result<Vec<RawRecord>>;

    /// Fetch the `sub_element` records (e.g. line items) of a parent record
    ///
    /// `parent` is a record previously returned by
    /// [`fetch_records`](Self::fetch_records) for `element`.
    async fn fetch_sub_records(
        &self,
        element: &str,
        sub_element: &str,
        parent: &RawRecord,
        attributes: &[String],
    ) -> Result<Vec<RawRecord>>;
}

/// Store and website lookups
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    /// Website a store belongs to, if the store exists
    async fn website_for_store(&self, store_id: StoreId) -> Result<Option<WebsiteId>>;

    /// All store ids under a website, ascending
    async fn store_ids(&self, website_id: WebsiteId) -> Result<Vec<StoreId>>;

    /// Display name of a store, if the store exists
    async fn store_name(&self, store_id: StoreId) -> Result<Option<String>>;
}

/// Registered customer lookups
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Load a customer row by id
    ///
    /// Returns `Ok(None)` when no customer has that id.
    async fn load_customer(
        &self,
        customer_id: u64,
        attributes: &[String],
    ) -> Result<Option<RawRecord>>;
}

/// Anonymous visitor data tracked by the host's session layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorSession {
    pub visitor_id: Option<u64>,
    pub first_visit_at: Option<String>,
    pub last_visit_at: Option<String>,
}

/// Key-value access to the current visitor's session
pub trait SessionProvider: Send + Sync {
    /// Value of a named cookie
    fn cookie(&self, name: &str) -> Option<String>;

    /// Id of the customer logged into this session
    fn logged_in_customer_id(&self) -> Option<u64>;

    /// Anonymous visitor tracking data
    fn visitor(&self) -> Option<VisitorSession>;
}

/// Session provider for contexts without a visitor, such as the backfill job
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionProvider for NoSession {
    fn cookie(&self, _name: &str) -> Option<String> {
        None
    }

    fn logged_in_customer_id(&self) -> Option<u64> {
        None
    }

    fn visitor(&self) -> Option<VisitorSession> {
        None
    }
}
