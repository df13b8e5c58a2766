//! Storage factory
//!
//! This module builds the pipeline storage and the store record source from
//! configuration.

use crate::adapters::database::traits::{AttemptStorage, QueueStorage, StateStorage};
use crate::adapters::memory::InMemoryStorage;
use crate::adapters::postgresql::{PostgreSQLAdapter, PostgreSQLClient};
use crate::adapters::source::PostgresRecordSource;
use crate::config::StorefeedConfig;
use crate::domain::Result;
use std::sync::Arc;

/// The three storage seams the pipeline writes through
#[derive(Clone)]
pub struct PipelineStorage {
    pub state: Arc<dyn StateStorage + Send + Sync>,
    pub queue: Arc<dyn QueueStorage + Send + Sync>,
    pub attempts: Arc<dyn AttemptStorage + Send + Sync>,
}

impl PipelineStorage {
    /// Use one backend for every seam
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: StateStorage + QueueStorage + AttemptStorage + Send + Sync + 'static,
    {
        Self {
            state: backend.clone(),
            queue: backend.clone(),
            attempts: backend,
        }
    }

    /// Fresh process-local storage
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryStorage::new()))
    }
}

/// Create the shared PostgreSQL client
///
/// # Errors
///
/// Returns an error if the client cannot be created
pub async fn create_postgres_client(config: &StorefeedConfig) -> Result<Arc<PostgreSQLClient>> {
    tracing::info!("Creating PostgreSQL client");
    Ok(Arc::new(PostgreSQLClient::new(config.postgresql.clone()).await?))
}

/// Create pipeline storage
///
/// Dry runs keep everything in memory so nothing is persisted. Otherwise the
/// pipeline tables are created if missing and PostgreSQL backs every seam.
///
/// # Errors
///
/// Returns an error if the schema cannot be created
pub async fn create_pipeline_storage(
    config: &StorefeedConfig,
    client: &Arc<PostgreSQLClient>,
) -> Result<PipelineStorage> {
    if config.application.dry_run {
        tracing::info!("DRY RUN: pipeline storage kept in memory");
        return Ok(PipelineStorage::in_memory());
    }

    client.run_migrations().await?;
    Ok(PipelineStorage::from_backend(Arc::new(
        PostgreSQLAdapter::new(client.clone()),
    )))
}

/// Create the store record source over the shop tables
pub fn create_record_source(
    config: &StorefeedConfig,
    client: &Arc<PostgreSQLClient>,
) -> Arc<PostgresRecordSource> {
    Arc::new(PostgresRecordSource::new(
        client.clone(),
        config.source.clone(),
    ))
}
