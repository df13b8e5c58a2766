//! Pipeline storage layer
//!
//! This module provides the trait-based abstraction over where queued
//! events, batches, attempts and backfill progress live (PostgreSQL or
//! memory), and the factory that picks one from configuration.

pub mod factory;
pub mod traits;

pub use factory::{
    create_pipeline_storage, create_postgres_client, create_record_source, PipelineStorage,
};
pub use traits::{AttemptStorage, QueueCounts, QueueStorage, QueuedEvent, StateStorage};
