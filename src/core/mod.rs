//! Core business logic for Storefeed.
//!
//! # Modules
//!
//! - [`mapping`] - Field mapping definition, cache and mapper
//! - [`format`] - Entity formatters (customer, catalog, visit, dates)
//! - [`export`] - Event assembly, batching, transmission and the backfill job
//! - [`state`] - Backfill run state and historical push status
//!
//! # Backfill Workflow
//!
//! 1. **Resolve**: find the store's website and all of its stores
//! 2. **Convert**: map each record to an event and queue it
//! 3. **Batch**: chunk queued events into fixed-size batches
//! 4. **Send**: POST each batch, logging one attempt per response
//! 5. **Checkpoint**: record the next phase after each one completes
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use storefeed::adapters::api::DryRunTransport;
//! use storefeed::adapters::database::PipelineStorage;
//! use storefeed::adapters::memory::InMemoryStore;
//! use storefeed::adapters::source::NoSession;
//! use storefeed::config::StorefeedConfig;
//! use storefeed::core::export::{AttemptTracker, BackfillSettings, EventAssembler, HistoricalBackfillJob};
//! use storefeed::core::mapping::{EmbeddedMappingSource, FieldMapper, InMemoryMappingCache};
//! use storefeed::domain::{StoreId, WebsiteId};
//!
//! # async fn example(config: StorefeedConfig) {
//! let store = Arc::new(InMemoryStore::new().with_store(StoreId::new(1), WebsiteId::new(1), "Main"));
//! let mapper = Arc::new(FieldMapper::new(
//!     Arc::new(EmbeddedMappingSource),
//!     Arc::new(InMemoryMappingCache::new()),
//! ));
//! let storage = PipelineStorage::in_memory();
//! let assembler = EventAssembler::new(
//!     mapper,
//!     store.clone(),
//!     store.clone(),
//!     store.clone(),
//!     Arc::new(NoSession),
//! );
//! let tracker = AttemptTracker::new(Arc::new(DryRunTransport), storage.attempts.clone());
//!
//! let job = HistoricalBackfillJob::new(
//!     BackfillSettings::from_config(&config),
//!     store.clone(),
//!     store,
//!     assembler,
//!     storage,
//!     tracker,
//! );
//! let summary = job.perform(StoreId::new(1), false).await;
//! assert!(summary.is_successful());
//! # }
//! ```

pub mod export;
pub mod format;
pub mod mapping;
pub mod state;
