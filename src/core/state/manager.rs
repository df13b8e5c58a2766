//! State manager for run state and push status persistence

use super::run_state::{HistoricalPushStatus, JobPhase, JobRunState, PushStatus};
use crate::adapters::database::traits::StateStorage;
use crate::domain::{Result, StoreId, WebsiteId};
use std::sync::Arc;

/// Loads and saves backfill progress through a [`StateStorage`] backend
pub struct StateManager {
    storage: Arc<dyn StateStorage + Send + Sync>,
}

impl StateManager {
    /// Create a new StateManager with a state storage backend
    pub fn new_with_storage(storage: Arc<dyn StateStorage + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Load a website's run state
    ///
    /// Returns `Ok(None)` if the website has never been backfilled.
    pub async fn load_run_state(&self, website_id: WebsiteId) -> Result<Option<JobRunState>> {
        self.storage.load_run_state(website_id).await
    }

    /// Run state to start from
    ///
    /// With `resume` a stored, unfinished state is continued at its recorded
    /// phase. Otherwise, or when nothing resumable is stored, a fresh state
    /// at `Convert` is returned. The store list is always refreshed.
    pub async fn begin_run(
        &self,
        website_id: WebsiteId,
        store_ids: Vec<StoreId>,
        resume: bool,
    ) -> Result<JobRunState> {
        let stored = if resume {
            self.load_run_state(website_id).await?
        } else {
            None
        };

        let state = match stored {
            Some(mut state) if !state.is_complete() => {
                tracing::info!(
                    website_id = %website_id,
                    phase = %state.phase,
                    "Resuming backfill"
                );
                state.store_ids = store_ids;
                state
            }
            _ => JobRunState::new(website_id, store_ids),
        };

        self.storage.save_run_state(&state).await?;
        Ok(state)
    }

    /// Checkpoint a finished phase
    pub async fn complete_phase(&self, state: &mut JobRunState, phase: JobPhase) -> Result<()> {
        state.advance_past(phase);
        tracing::info!(
            website_id = %state.website_id,
            completed = %phase,
            next = %state.phase,
            "Checkpointing phase"
        );
        self.storage.save_run_state(state).await
    }

    /// Current push status of a website; `NotStarted` if never recorded
    pub async fn push_status(&self, website_id: WebsiteId) -> Result<PushStatus> {
        Ok(self
            .storage
            .load_push_status(website_id)
            .await?
            .map(|s| s.status)
            .unwrap_or_default())
    }

    /// Record a website's push status
    pub async fn set_push_status(&self, website_id: WebsiteId, status: PushStatus) -> Result<()> {
        self.storage
            .save_push_status(&HistoricalPushStatus::new(website_id, status))
            .await
    }

    /// Push status of every website that has one
    pub async fn all_push_statuses(&self) -> Result<Vec<HistoricalPushStatus>> {
        self.storage.list_push_statuses().await
    }
}
