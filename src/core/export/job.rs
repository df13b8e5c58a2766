//! Historical backfill job
//!
//! Pushes every historical record of a website through the pipeline in
//! three checkpointed phases:
//!
//! 1. **Convert**: fetch each store's records per element, assemble events,
//!    queue them
//! 2. **Batch**: chunk the queued events into batches
//! 3. **Send**: transmit unsent batches, retrying rejected ones
//!
//! The run state records the next phase after each one completes. A failed
//! phase leaves the state where it was and marks the website's push status
//! `failed`.

use super::assembler::EventAssembler;
use super::attempt::{send_with_retry, AttemptTracker, RetryPolicy};
use super::batch::build_batches;
use super::summary::JobSummary;
use crate::adapters::database::{PipelineStorage, QueueStorage};
use crate::adapters::source::{RecordSource, StoreDirectory};
use crate::config::StorefeedConfig;
use crate::core::state::{JobPhase, JobRunState, PushStatus, StateManager};
use crate::domain::{Result, StoreId, StorefeedError, WebsiteId};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables of a backfill run
#[derive(Debug, Clone, PartialEq)]
pub struct BackfillSettings {
    /// Maximum events per batch
    pub batch_size: usize,

    /// Top-level elements to export, in order
    pub elements: Vec<String>,

    /// Continue an interrupted run at its recorded phase
    pub resume_phases: bool,

    /// Advisory run time limit; exceeding it is logged
    pub max_execution_time: Duration,

    /// Advisory memory limit, logged at start
    pub memory_limit_mb: u64,

    /// Retry policy for rejected batches
    pub retry: RetryPolicy,
}

impl BackfillSettings {
    pub fn from_config(config: &StorefeedConfig) -> Self {
        Self {
            batch_size: config.export.batch_size,
            elements: config.export.elements.clone(),
            resume_phases: config.export.resume_phases,
            max_execution_time: Duration::from_secs(config.export.max_execution_time_secs),
            memory_limit_mb: config.export.memory_limit_mb,
            retry: RetryPolicy::from(&config.api.retry),
        }
    }
}

/// The backfill job
pub struct HistoricalBackfillJob {
    settings: BackfillSettings,
    source: Arc<dyn RecordSource>,
    stores: Arc<dyn StoreDirectory>,
    assembler: EventAssembler,
    state: StateManager,
    queue: Arc<dyn QueueStorage + Send + Sync>,
    tracker: AttemptTracker,
}

impl HistoricalBackfillJob {
    pub fn new(
        settings: BackfillSettings,
        source: Arc<dyn RecordSource>,
        stores: Arc<dyn StoreDirectory>,
        assembler: EventAssembler,
        storage: PipelineStorage,
        tracker: AttemptTracker,
    ) -> Self {
        Self {
            settings,
            source,
            stores,
            assembler,
            state: StateManager::new_with_storage(storage.state),
            queue: storage.queue,
            tracker,
        }
    }

    /// Run the backfill for the website owning `store_id`
    ///
    /// A website already pushed completely is skipped unless `force` is set.
    /// Never fails: errors are logged and reported in the summary.
    pub async fn perform(&self, store_id: StoreId, force: bool) -> JobSummary {
        let started = Instant::now();
        let mut summary = JobSummary::new(store_id);

        tracing::info!(
            store_id = %store_id,
            force,
            batch_size = self.settings.batch_size,
            max_execution_time_secs = self.settings.max_execution_time.as_secs(),
            memory_limit_mb = self.settings.memory_limit_mb,
            "Starting historical backfill"
        );

        if let Err(error) = self.run(store_id, force, &mut summary).await {
            crate::log_error_with_context!(&error, "Historical backfill halted");
            let phase = summary.error.as_ref().and_then(|e| e.phase);
            summary.fail(phase, &error);
        }

        let elapsed = started.elapsed();
        if elapsed > self.settings.max_execution_time {
            tracing::warn!(
                elapsed_secs = elapsed.as_secs(),
                limit_secs = self.settings.max_execution_time.as_secs(),
                "Backfill exceeded its execution time limit"
            );
        }

        let summary = summary.with_duration(elapsed);
        summary.log_summary();
        summary
    }

    async fn run(&self, store_id: StoreId, force: bool, summary: &mut JobSummary) -> Result<()> {
        let website_id = self
            .stores
            .website_for_store(store_id)
            .await?
            .ok_or_else(|| {
                StorefeedError::Validation(format!("Unknown store {store_id}"))
                    .with_origin("HistoricalBackfillJob::perform")
            })?;
        summary.website_id = Some(website_id);

        let status = self.state.push_status(website_id).await?;
        if status == PushStatus::Complete && !force {
            summary.skipped = true;
            summary.status = status;
            return Ok(());
        }

        let store_ids = self.stores.store_ids(website_id).await?;
        let mut state = self
            .state
            .begin_run(website_id, store_ids, self.settings.resume_phases)
            .await?;
        summary.started_at = Some(state.phase);

        self.state
            .set_push_status(website_id, PushStatus::InProgress)
            .await?;
        summary.status = PushStatus::InProgress;

        while !state.is_complete() {
            let phase = state.phase;
            crate::log_phase_start!(phase, website_id);

            let outcome = match self.run_phase(phase, &state, summary).await {
                Ok(()) => self.state.complete_phase(&mut state, phase).await,
                Err(error) => Err(error),
            };
            if let Err(error) = outcome {
                return Err(self.halt(website_id, phase, error, summary).await);
            }
            summary.completed_phases.push(phase);
        }

        if let Err(error) = self
            .state
            .set_push_status(website_id, PushStatus::Complete)
            .await
        {
            return Err(self.halt(website_id, JobPhase::Complete, error, summary).await);
        }
        summary.status = PushStatus::Complete;
        Ok(())
    }

    /// Mark the website failed and tag the error with the phase it broke
    ///
    /// Also used when checkpointing a phase or recording completion fails.
    async fn halt(
        &self,
        website_id: WebsiteId,
        phase: JobPhase,
        error: StorefeedError,
        summary: &mut JobSummary,
    ) -> StorefeedError {
        let error = error.with_origin(format!("HistoricalBackfillJob::{phase}"));
        summary.fail(Some(phase), &error);
        if let Err(status_error) = self
            .state
            .set_push_status(website_id, PushStatus::Failed)
            .await
        {
            crate::log_error_with_context!(&status_error, "Failed to record failed push status");
        }
        error
    }

    async fn run_phase(
        &self,
        phase: JobPhase,
        state: &JobRunState,
        summary: &mut JobSummary,
    ) -> Result<()> {
        match phase {
            JobPhase::Convert => {
                summary.events_queued += self.convert(state).await?;
            }
            JobPhase::Batch => {
                summary.batches_built += self.batch(state.website_id).await?;
            }
            JobPhase::Send => self.send(state.website_id, summary).await?,
            JobPhase::Complete => {}
        }
        Ok(())
    }

    async fn convert(&self, state: &JobRunState) -> Result<usize> {
        let website_id = state.website_id;

        let cleared = self.queue.clear_pending(website_id).await?;
        if cleared.unbatched_events > 0 || cleared.unsent_batches > 0 {
            tracing::info!(
                website_id = %website_id,
                events = cleared.unbatched_events,
                batches = cleared.unsent_batches,
                "Cleared work left by an earlier run"
            );
        }

        let mut queued = 0;
        for &store_id in &state.store_ids {
            for element in &self.settings.elements {
                let attributes = self.assembler.attributes_for(element)?;
                let records = self
                    .source
                    .fetch_records(element, store_id, &attributes)
                    .await
                    .map_err(|e| {
                        e.with_origin(format!("RecordSource::fetch_records({element})"))
                    })?;

                let mut events = Vec::with_capacity(records.len());
                for record in &records {
                    events.push(self.assembler.assemble(element, store_id, record).await?);
                }

                queued += self
                    .queue
                    .enqueue_events(website_id, store_id, &events)
                    .await?;

                tracing::info!(
                    website_id = %website_id,
                    store_id = %store_id,
                    element = %element,
                    events = events.len(),
                    "Converted records"
                );
            }
        }
        Ok(queued)
    }

    async fn batch(&self, website_id: WebsiteId) -> Result<usize> {
        let queued = self.queue.unbatched_events(website_id).await?;
        let consumed: Vec<i64> = queued.iter().map(|e| e.id).collect();
        let events = queued.into_iter().map(|e| e.event).collect();

        let batches = build_batches(events, self.settings.batch_size)?;
        self.queue
            .save_batches(website_id, &batches, &consumed)
            .await?;

        tracing::info!(
            website_id = %website_id,
            events = consumed.len(),
            batches = batches.len(),
            "Built batches"
        );
        Ok(batches.len())
    }

    async fn send(&self, website_id: WebsiteId, summary: &mut JobSummary) -> Result<()> {
        let batches = self.queue.unsent_batches(website_id).await?;
        tracing::info!(website_id = %website_id, batches = batches.len(), "Sending batches");

        for batch in &batches {
            let attempts = send_with_retry(&self.tracker, batch, &self.settings.retry).await?;

            summary.attempts += attempts.len();
            summary.rejected_attempts += attempts.iter().filter(|a| !a.is_success()).count();
            if attempts.last().is_some_and(|a| !a.is_success()) {
                tracing::warn!(
                    batch_id = %batch.id,
                    attempts = attempts.len(),
                    "Batch still rejected after retries, marking complete"
                );
            }

            self.queue.mark_batch_complete(batch.id).await?;
            summary.batches_sent += 1;
        }
        Ok(())
    }
}
