//! In-memory pipeline storage
//!
//! Implements every storage trait over plain collections behind one mutex.
//! Backs dry runs and tests; nothing survives the process.

use crate::adapters::database::traits::{
    AttemptStorage, QueueCounts, QueueStorage, QueuedEvent, StateStorage,
};
use crate::core::export::batch::Batch;
use crate::core::state::{HistoricalPushStatus, JobRunState};
use crate::domain::{
    Attempt, AttemptId, BatchError, BatchId, NewAttempt, NormalizedEvent, Result, StoreId,
    StorefeedError, WebsiteId,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

struct StoredBatch {
    website_id: WebsiteId,
    batch: Batch,
    complete: bool,
}

#[derive(Default)]
struct Tables {
    run_states: BTreeMap<WebsiteId, JobRunState>,
    push_statuses: BTreeMap<WebsiteId, HistoricalPushStatus>,
    events: Vec<(QueuedEvent, bool)>,
    next_event_id: i64,
    batches: Vec<StoredBatch>,
    attempts: Vec<Attempt>,
    errors: Vec<BatchError>,
}

/// Process-local implementation of the storage traits
#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StorefeedError::Database("in-memory storage lock poisoned".to_string()))
    }

    /// Every attempt recorded, in insertion order
    pub fn all_attempts(&self) -> Vec<Attempt> {
        self.tables()
            .map(|t| t.attempts.clone())
            .unwrap_or_default()
    }

    /// Every error recorded, in insertion order
    pub fn all_errors(&self) -> Vec<BatchError> {
        self.tables().map(|t| t.errors.clone()).unwrap_or_default()
    }

    /// Number of stored batches, sent or not
    pub fn batch_count(&self) -> usize {
        self.tables().map(|t| t.batches.len()).unwrap_or(0)
    }
}

#[async_trait]
impl StateStorage for InMemoryStorage {
    async fn load_run_state(&self, website_id: WebsiteId) -> Result<Option<JobRunState>> {
        Ok(self.tables()?.run_states.get(&website_id).cloned())
    }

    async fn save_run_state(&self, state: &JobRunState) -> Result<()> {
        self.tables()?
            .run_states
            .insert(state.website_id, state.clone());
        Ok(())
    }

    async fn load_push_status(
        &self,
        website_id: WebsiteId,
    ) -> Result<Option<HistoricalPushStatus>> {
        Ok(self.tables()?.push_statuses.get(&website_id).cloned())
    }

    async fn save_push_status(&self, status: &HistoricalPushStatus) -> Result<()> {
        self.tables()?
            .push_statuses
            .insert(status.website_id, status.clone());
        Ok(())
    }

    async fn list_push_statuses(&self) -> Result<Vec<HistoricalPushStatus>> {
        Ok(self.tables()?.push_statuses.values().cloned().collect())
    }
}

#[async_trait]
impl QueueStorage for InMemoryStorage {
    async fn enqueue_events(
        &self,
        website_id: WebsiteId,
        store_id: StoreId,
        events: &[NormalizedEvent],
    ) -> Result<usize> {
        let mut tables = self.tables()?;
        for event in events {
            tables.next_event_id += 1;
            let id = tables.next_event_id;
            tables.events.push((
                QueuedEvent {
                    id,
                    website_id,
                    store_id,
                    event: event.clone(),
                    created_at: Utc::now(),
                },
                false,
            ));
        }
        Ok(events.len())
    }

    async fn unbatched_events(&self, website_id: WebsiteId) -> Result<Vec<QueuedEvent>> {
        Ok(self
            .tables()?
            .events
            .iter()
            .filter(|(e, batched)| !batched && e.website_id == website_id)
            .map(|(e, _)| e.clone())
            .collect())
    }

    async fn save_batches(
        &self,
        website_id: WebsiteId,
        batches: &[Batch],
        consumed_event_ids: &[i64],
    ) -> Result<()> {
        let mut tables = self.tables()?;
        let consumed: HashSet<i64> = consumed_event_ids.iter().copied().collect();
        for (event, batched) in tables.events.iter_mut() {
            if consumed.contains(&event.id) {
                *batched = true;
            }
        }
        tables
            .batches
            .extend(batches.iter().cloned().map(|batch| StoredBatch {
                website_id,
                batch,
                complete: false,
            }));
        Ok(())
    }

    async fn unsent_batches(&self, website_id: WebsiteId) -> Result<Vec<Batch>> {
        Ok(self
            .tables()?
            .batches
            .iter()
            .filter(|b| !b.complete && b.website_id == website_id)
            .map(|b| b.batch.clone())
            .collect())
    }

    async fn mark_batch_complete(&self, batch_id: BatchId) -> Result<()> {
        let mut tables = self.tables()?;
        let stored = tables
            .batches
            .iter_mut()
            .find(|b| b.batch.id == batch_id)
            .ok_or_else(|| StorefeedError::Database(format!("Unknown batch {batch_id}")))?;
        stored.complete = true;
        Ok(())
    }

    async fn clear_pending(&self, website_id: WebsiteId) -> Result<QueueCounts> {
        let mut tables = self.tables()?;

        let events_before = tables.events.len();
        tables
            .events
            .retain(|(e, batched)| *batched || e.website_id != website_id);

        let batches_before = tables.batches.len();
        tables
            .batches
            .retain(|b| b.complete || b.website_id != website_id);

        Ok(QueueCounts {
            unbatched_events: events_before - tables.events.len(),
            unsent_batches: batches_before - tables.batches.len(),
        })
    }

    async fn pending_counts(&self, website_id: WebsiteId) -> Result<QueueCounts> {
        let tables = self.tables()?;
        Ok(QueueCounts {
            unbatched_events: tables
                .events
                .iter()
                .filter(|(e, batched)| !batched && e.website_id == website_id)
                .count(),
            unsent_batches: tables
                .batches
                .iter()
                .filter(|b| !b.complete && b.website_id == website_id)
                .count(),
        })
    }
}

#[async_trait]
impl AttemptStorage for InMemoryStorage {
    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt> {
        let mut tables = self.tables()?;
        let id = AttemptId::new(tables.attempts.len() as i64 + 1);
        let attempt = Attempt::from_new(id, attempt);
        tables.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn record_error(&self, attempt_id: AttemptId, details: &str) -> Result<BatchError> {
        let error = BatchError {
            attempt_id,
            details: details.to_string(),
            created_dt: Utc::now(),
        };
        self.tables()?.errors.push(error.clone());
        Ok(error)
    }

    async fn attempts_for_batch(&self, batch_id: BatchId) -> Result<Vec<Attempt>> {
        Ok(self
            .tables()?
            .attempts
            .iter()
            .filter(|a| a.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn error_for_attempt(&self, attempt_id: AttemptId) -> Result<Option<BatchError>> {
        Ok(self
            .tables()?
            .errors
            .iter()
            .find(|e| e.attempt_id == attempt_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(n: usize) -> Vec<NormalizedEvent> {
        (0..n).map(|_| NormalizedEvent::new("order")).collect()
    }

    #[tokio::test]
    async fn test_queue_then_batch() {
        let storage = InMemoryStorage::new();
        let website = WebsiteId::new(1);

        storage
            .enqueue_events(website, StoreId::new(1), &events(3))
            .await
            .unwrap();
        let queued = storage.unbatched_events(website).await.unwrap();
        assert_eq!(queued.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let batch = Batch::new(queued.iter().map(|e| e.event.clone()).collect());
        storage
            .save_batches(website, &[batch.clone()], &[1, 2, 3])
            .await
            .unwrap();

        assert!(storage.unbatched_events(website).await.unwrap().is_empty());
        assert_eq!(storage.unsent_batches(website).await.unwrap(), vec![batch.clone()]);

        storage.mark_batch_complete(batch.id).await.unwrap();
        assert_eq!(
            storage.pending_counts(website).await.unwrap(),
            QueueCounts::default()
        );
    }

    #[tokio::test]
    async fn test_clear_pending_is_scoped_to_website() {
        let storage = InMemoryStorage::new();
        let (a, b) = (WebsiteId::new(1), WebsiteId::new(2));

        storage.enqueue_events(a, StoreId::new(1), &events(2)).await.unwrap();
        storage.enqueue_events(b, StoreId::new(2), &events(1)).await.unwrap();
        storage
            .save_batches(a, &[Batch::new(events(1))], &[])
            .await
            .unwrap();

        let cleared = storage.clear_pending(a).await.unwrap();
        assert_eq!(cleared.unbatched_events, 2);
        assert_eq!(cleared.unsent_batches, 1);
        assert_eq!(storage.pending_counts(b).await.unwrap().unbatched_events, 1);
    }

    #[tokio::test]
    async fn test_attempt_log() {
        let storage = InMemoryStorage::new();
        let batch_id = BatchId::generate();

        let attempt = storage
            .record_attempt(NewAttempt {
                batch_id,
                http_code: 500,
                total_time: 0.5,
                created_dt: Utc::now(),
            })
            .await
            .unwrap();
        storage.record_error(attempt.id, "boom").await.unwrap();

        assert_eq!(storage.attempts_for_batch(batch_id).await.unwrap().len(), 1);
        assert_eq!(
            storage
                .error_for_attempt(attempt.id)
                .await
                .unwrap()
                .unwrap()
                .details,
            "boom"
        );
    }

    #[tokio::test]
    async fn test_mark_unknown_batch_fails() {
        let storage = InMemoryStorage::new();
        assert!(storage
            .mark_batch_complete(BatchId::generate())
            .await
            .is_err());
    }
}
