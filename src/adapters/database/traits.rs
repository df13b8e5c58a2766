//! Pipeline storage traits
//!
//! This module defines the traits that storage adapters implement to hold
//! the pipeline's own data: queued events, batches, transmission attempts
//! and backfill progress.

use crate::core::export::batch::Batch;
use crate::core::state::{HistoricalPushStatus, JobRunState};
use crate::domain::{
    Attempt, AttemptId, BatchError, BatchId, NewAttempt, NormalizedEvent, Result, StoreId,
    WebsiteId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// An event waiting in the queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
    /// Queue position; ascending ids are queue order
    pub id: i64,
    pub website_id: WebsiteId,
    pub store_id: StoreId,
    pub event: NormalizedEvent,
    pub created_at: DateTime<Utc>,
}

/// Outstanding work for a website
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub unbatched_events: usize,
    pub unsent_batches: usize,
}

/// State storage trait for backfill progress
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load a website's run state
    ///
    /// Returns `Ok(None)` if none was saved.
    async fn load_run_state(&self, website_id: WebsiteId) -> Result<Option<JobRunState>>;

    /// Save (upsert) a website's run state
    async fn save_run_state(&self, state: &JobRunState) -> Result<()>;

    /// Load a website's historical push status
    async fn load_push_status(&self, website_id: WebsiteId)
        -> Result<Option<HistoricalPushStatus>>;

    /// Save (upsert) a website's historical push status
    async fn save_push_status(&self, status: &HistoricalPushStatus) -> Result<()>;

    /// Every recorded push status, ordered by website id
    async fn list_push_statuses(&self) -> Result<Vec<HistoricalPushStatus>>;
}

/// Event queue and batch storage
#[async_trait]
pub trait QueueStorage: Send + Sync {
    /// Append events to the queue in the given order
    ///
    /// Returns the number of events queued.
    async fn enqueue_events(
        &self,
        website_id: WebsiteId,
        store_id: StoreId,
        events: &[NormalizedEvent],
    ) -> Result<usize>;

    /// Queued events not yet assigned to a batch, in queue order
    async fn unbatched_events(&self, website_id: WebsiteId) -> Result<Vec<QueuedEvent>>;

    /// Persist built batches and mark the events they consumed as batched
    ///
    /// Batches keep the order given; implementations apply both changes
    /// atomically.
    async fn save_batches(
        &self,
        website_id: WebsiteId,
        batches: &[Batch],
        consumed_event_ids: &[i64],
    ) -> Result<()>;

    /// Batches not yet marked complete, in build order
    async fn unsent_batches(&self, website_id: WebsiteId) -> Result<Vec<Batch>>;

    /// Mark a batch complete so it is never sent again
    async fn mark_batch_complete(&self, batch_id: BatchId) -> Result<()>;

    /// Drop unbatched events and unsent batches for a website
    ///
    /// Returns the number of events and batches removed.
    async fn clear_pending(&self, website_id: WebsiteId) -> Result<QueueCounts>;

    /// Count outstanding work for a website
    async fn pending_counts(&self, website_id: WebsiteId) -> Result<QueueCounts>;
}

/// Append-only attempt log
#[async_trait]
pub trait AttemptStorage: Send + Sync {
    /// Store an attempt, assigning its id
    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt>;

    /// Store the error detail of a rejected attempt
    async fn record_error(&self, attempt_id: AttemptId, details: &str) -> Result<BatchError>;

    /// Attempts for a batch, oldest first
    async fn attempts_for_batch(&self, batch_id: BatchId) -> Result<Vec<Attempt>>;

    /// Error recorded for an attempt, if any
    async fn error_for_attempt(&self, attempt_id: AttemptId) -> Result<Option<BatchError>>;
}
