//! PostgreSQL adapter implementing the pipeline storage traits
//!
//! This module provides the implementation of StateStorage, QueueStorage and
//! AttemptStorage for PostgreSQL.

use crate::adapters::database::traits::{
    AttemptStorage, QueueCounts, QueueStorage, QueuedEvent, StateStorage,
};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    batch_error_from_row, store_param, website_param, PostgreSQLAttempt, PostgreSQLBatch,
    PostgreSQLPushStatus, PostgreSQLRunState,
};
use crate::core::export::batch::Batch;
use crate::core::state::{HistoricalPushStatus, JobRunState};
use crate::domain::{
    Attempt, AttemptId, BatchError, BatchId, NewAttempt, NormalizedEvent, Result, StoreId,
    StorefeedError, WebsiteId,
};
use async_trait::async_trait;
use std::sync::Arc;

fn db_error(action: &str) -> impl Fn(tokio_postgres::Error) -> StorefeedError + '_ {
    move |e| StorefeedError::Database(format!("Failed to {action}: {e}"))
}

/// PostgreSQL implementation of the storage traits
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter over a shared client
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StateStorage for PostgreSQLAdapter {
    async fn load_run_state(&self, website_id: WebsiteId) -> Result<Option<JobRunState>> {
        tracing::debug!(website_id = %website_id, "Loading run state from PostgreSQL");

        let row = self
            .client
            .query_opt(
                "SELECT * FROM storefeed_job_state WHERE website_id = $1",
                &[&website_param(website_id)?],
            )
            .await?;

        row.map(|row| PostgreSQLRunState::from_row(&row).to_domain())
            .transpose()
    }

    async fn save_run_state(&self, state: &JobRunState) -> Result<()> {
        let row = PostgreSQLRunState::from_domain(state)?;

        let upsert_query = r#"
            INSERT INTO storefeed_job_state (website_id, store_ids, phase, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (website_id) DO UPDATE SET
                store_ids = EXCLUDED.store_ids,
                phase = EXCLUDED.phase,
                updated_at = EXCLUDED.updated_at
        "#;

        self.client
            .execute(
                upsert_query,
                &[&row.website_id, &row.store_ids, &row.phase, &row.updated_at],
            )
            .await?;

        tracing::debug!(
            website_id = %state.website_id,
            phase = %state.phase,
            "Run state saved to PostgreSQL"
        );
        Ok(())
    }

    async fn load_push_status(
        &self,
        website_id: WebsiteId,
    ) -> Result<Option<HistoricalPushStatus>> {
        let row = self
            .client
            .query_opt(
                "SELECT * FROM storefeed_push_status WHERE website_id = $1",
                &[&website_param(website_id)?],
            )
            .await?;

        row.map(|row| PostgreSQLPushStatus::from_row(&row).to_domain())
            .transpose()
    }

    async fn save_push_status(&self, status: &HistoricalPushStatus) -> Result<()> {
        let row = PostgreSQLPushStatus::from_domain(status)?;

        let upsert_query = r#"
            INSERT INTO storefeed_push_status (website_id, status, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (website_id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
        "#;

        self.client
            .execute(upsert_query, &[&row.website_id, &row.status, &row.updated_at])
            .await?;
        Ok(())
    }

    async fn list_push_statuses(&self) -> Result<Vec<HistoricalPushStatus>> {
        let rows = self
            .client
            .query("SELECT * FROM storefeed_push_status ORDER BY website_id", &[])
            .await?;

        rows.iter()
            .map(|row| PostgreSQLPushStatus::from_row(row).to_domain())
            .collect()
    }
}

#[async_trait]
impl QueueStorage for PostgreSQLAdapter {
    async fn enqueue_events(
        &self,
        website_id: WebsiteId,
        store_id: StoreId,
        events: &[NormalizedEvent],
    ) -> Result<usize> {
        let website = website_param(website_id)?;
        let store = store_param(store_id)?;

        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_error("begin enqueue transaction"))?;
        let statement = tx
            .prepare(
                "INSERT INTO storefeed_event_queue (website_id, store_id, event) VALUES ($1, $2, $3)",
            )
            .await
            .map_err(db_error("prepare enqueue"))?;

        for event in events {
            let body = serde_json::to_value(event)?;
            tx.execute(&statement, &[&website, &store, &body])
                .await
                .map_err(db_error("enqueue event"))?;
        }

        tx.commit().await.map_err(db_error("commit enqueue"))?;

        tracing::debug!(
            website_id = %website_id,
            store_id = %store_id,
            count = events.len(),
            "Events queued in PostgreSQL"
        );
        Ok(events.len())
    }

    async fn unbatched_events(&self, website_id: WebsiteId) -> Result<Vec<QueuedEvent>> {
        let rows = self
            .client
            .query(
                "SELECT id, store_id, event, created_at FROM storefeed_event_queue \
                 WHERE website_id = $1 AND NOT batched ORDER BY id",
                &[&website_param(website_id)?],
            )
            .await?;

        rows.iter()
            .map(|row| {
                let store: i32 = row.get("store_id");
                let store_id = u32::try_from(store).map(StoreId::new).map_err(|_| {
                    StorefeedError::Database(format!("negative store id {store}"))
                })?;
                Ok(QueuedEvent {
                    id: row.get("id"),
                    website_id,
                    store_id,
                    event: serde_json::from_value(row.get("event"))?,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    async fn save_batches(
        &self,
        website_id: WebsiteId,
        batches: &[Batch],
        consumed_event_ids: &[i64],
    ) -> Result<()> {
        let website = website_param(website_id)?;

        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_error("begin batch transaction"))?;

        for batch in batches {
            let row = PostgreSQLBatch::from_domain(batch)?;
            let event_count = i32::try_from(batch.len()).map_err(|_| {
                StorefeedError::Database(format!("batch {} too large", batch.id))
            })?;
            tx.execute(
                "INSERT INTO storefeed_batch (id, website_id, events, event_count, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[&row.id, &website, &row.events, &event_count, &row.created_at],
            )
            .await
            .map_err(db_error("insert batch"))?;
        }

        tx.execute(
            "UPDATE storefeed_event_queue SET batched = TRUE WHERE id = ANY($1)",
            &[&consumed_event_ids],
        )
        .await
        .map_err(db_error("mark events batched"))?;

        tx.commit().await.map_err(db_error("commit batches"))?;

        tracing::debug!(
            website_id = %website_id,
            batches = batches.len(),
            events = consumed_event_ids.len(),
            "Batches saved to PostgreSQL"
        );
        Ok(())
    }

    async fn unsent_batches(&self, website_id: WebsiteId) -> Result<Vec<Batch>> {
        let rows = self
            .client
            .query(
                "SELECT id, events, created_at FROM storefeed_batch \
                 WHERE website_id = $1 AND NOT complete ORDER BY seq",
                &[&website_param(website_id)?],
            )
            .await?;

        rows.iter()
            .map(|row| PostgreSQLBatch::from_row(row).to_domain())
            .collect()
    }

    async fn mark_batch_complete(&self, batch_id: BatchId) -> Result<()> {
        let updated = self
            .client
            .execute(
                "UPDATE storefeed_batch SET complete = TRUE WHERE id = $1",
                &[batch_id.as_uuid()],
            )
            .await?;

        if updated == 0 {
            return Err(StorefeedError::Database(format!("Unknown batch {batch_id}")));
        }
        Ok(())
    }

    async fn clear_pending(&self, website_id: WebsiteId) -> Result<QueueCounts> {
        let website = website_param(website_id)?;

        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_error("begin clear transaction"))?;

        let events = tx
            .execute(
                "DELETE FROM storefeed_event_queue WHERE website_id = $1 AND NOT batched",
                &[&website],
            )
            .await
            .map_err(db_error("clear queued events"))?;
        let batches = tx
            .execute(
                "DELETE FROM storefeed_batch WHERE website_id = $1 AND NOT complete",
                &[&website],
            )
            .await
            .map_err(db_error("clear unsent batches"))?;

        tx.commit().await.map_err(db_error("commit clear"))?;

        Ok(QueueCounts {
            unbatched_events: events as usize,
            unsent_batches: batches as usize,
        })
    }

    async fn pending_counts(&self, website_id: WebsiteId) -> Result<QueueCounts> {
        let website = website_param(website_id)?;
        let rows = self
            .client
            .query(
                "SELECT \
                   (SELECT COUNT(*) FROM storefeed_event_queue WHERE website_id = $1 AND NOT batched) AS events, \
                   (SELECT COUNT(*) FROM storefeed_batch WHERE website_id = $1 AND NOT complete) AS batches",
                &[&website],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(QueueCounts::default());
        };
        let events: i64 = row.get("events");
        let batches: i64 = row.get("batches");
        Ok(QueueCounts {
            unbatched_events: events as usize,
            unsent_batches: batches as usize,
        })
    }
}

#[async_trait]
impl AttemptStorage for PostgreSQLAdapter {
    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt> {
        let http_code = i32::from(attempt.http_code);
        let rows = self
            .client
            .query(
                "INSERT INTO storefeed_batch_attempt (batch_id, http_code, total_time, created_dt) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
                &[
                    attempt.batch_id.as_uuid(),
                    &http_code,
                    &attempt.total_time,
                    &attempt.created_dt,
                ],
            )
            .await?;

        let id: i64 = rows
            .first()
            .map(|row| row.get("id"))
            .ok_or_else(|| StorefeedError::Database("attempt insert returned no id".to_string()))?;

        Ok(Attempt::from_new(AttemptId::new(id), attempt))
    }

    async fn record_error(&self, attempt_id: AttemptId, details: &str) -> Result<BatchError> {
        let rows = self
            .client
            .query(
                "INSERT INTO storefeed_batch_error (attempt_id, details) VALUES ($1, $2) \
                 RETURNING attempt_id, details, created_dt",
                &[&attempt_id.value(), &details],
            )
            .await?;

        rows.first()
            .map(batch_error_from_row)
            .ok_or_else(|| StorefeedError::Database("error insert returned no row".to_string()))
    }

    async fn attempts_for_batch(&self, batch_id: BatchId) -> Result<Vec<Attempt>> {
        let rows = self
            .client
            .query(
                "SELECT * FROM storefeed_batch_attempt WHERE batch_id = $1 ORDER BY id",
                &[batch_id.as_uuid()],
            )
            .await?;

        rows.iter()
            .map(|row| PostgreSQLAttempt::from_row(row).to_domain())
            .collect()
    }

    async fn error_for_attempt(&self, attempt_id: AttemptId) -> Result<Option<BatchError>> {
        let row = self
            .client
            .query_opt(
                "SELECT attempt_id, details, created_dt FROM storefeed_batch_error WHERE attempt_id = $1",
                &[&attempt_id.value()],
            )
            .await?;

        Ok(row.as_ref().map(batch_error_from_row))
    }
}
