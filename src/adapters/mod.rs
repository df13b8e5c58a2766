//! External system integrations for Storefeed.
//!
//! This module provides adapters for the systems around the pipeline:
//!
//! - [`source`] - Store-side collaborators (records, stores, customers, sessions)
//! - [`api`] - Analytics ingestion API transport
//! - [`database`] - Pipeline storage abstraction layer (trait-based)
//! - [`postgresql`] - PostgreSQL implementation
//! - [`memory`] - In-memory implementation for dry runs and tests
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits so the core can be
//! exercised with in-memory implementations.
//!
//! ```rust
//! use std::sync::Arc;
//! use storefeed::adapters::database::PipelineStorage;
//! use storefeed::adapters::memory::InMemoryStore;
//! use storefeed::adapters::source::StoreDirectory;
//! use storefeed::domain::{StoreId, WebsiteId};
//!
//! # async fn example() -> storefeed::domain::Result<()> {
//! let stores = Arc::new(InMemoryStore::new().with_store(StoreId::new(1), WebsiteId::new(1), "Main"));
//! assert_eq!(stores.website_for_store(StoreId::new(1)).await?, Some(WebsiteId::new(1)));
//!
//! let storage = PipelineStorage::in_memory();
//! assert!(storage.state.list_push_statuses().await?.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod database;
pub mod memory;
pub mod postgresql;
pub mod source;
