//! Backfill run summary and reporting
//!
//! This module defines the structure a backfill run reports back to its
//! invoker in place of an error.

use crate::core::state::{JobPhase, PushStatus};
use crate::domain::{StoreId, StorefeedError, WebsiteId};
use std::time::Duration;

/// Outcome of one [`HistoricalBackfillJob::perform`](super::job::HistoricalBackfillJob::perform) call
#[derive(Debug, Clone)]
pub struct JobSummary {
    /// Store the run was requested for
    pub store_id: StoreId,

    /// Website resolved from the store, if it could be resolved
    pub website_id: Option<WebsiteId>,

    /// Phase the run started at
    pub started_at: Option<JobPhase>,

    /// Phases completed during this run, in order
    pub completed_phases: Vec<JobPhase>,

    /// Push status when the run ended
    pub status: PushStatus,

    /// Whether the run was skipped because the website was already pushed
    pub skipped: bool,

    /// Events queued by the convert phase
    pub events_queued: usize,

    /// Batches built by the batch phase
    pub batches_built: usize,

    /// Batches the send phase finished with
    pub batches_sent: usize,

    /// Every attempt made, retries included
    pub attempts: usize,

    /// Attempts answered with a non-200 status
    pub rejected_attempts: usize,

    /// Duration of the run
    pub duration: Duration,

    /// The error that halted the run
    pub error: Option<JobError>,
}

impl JobSummary {
    /// Create a new empty summary for a store
    pub fn new(store_id: StoreId) -> Self {
        Self {
            store_id,
            website_id: None,
            started_at: None,
            completed_phases: Vec::new(),
            status: PushStatus::NotStarted,
            skipped: false,
            events_queued: 0,
            batches_built: 0,
            batches_sent: 0,
            attempts: 0,
            rejected_attempts: 0,
            duration: Duration::from_secs(0),
            error: None,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record the error that halted the run
    pub fn fail(&mut self, phase: Option<JobPhase>, error: &StorefeedError) {
        self.status = PushStatus::Failed;
        self.error = Some(JobError::from_error(phase, error));
    }

    /// Whether the run ended without an error
    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the run halted on a network or database connection problem
    pub fn failed_on_transport(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|e| e.category == "TRANSPORT" || e.category == "DATABASE")
    }

    /// Log the summary
    pub fn log_summary(&self) {
        if self.skipped {
            tracing::info!(
                store_id = %self.store_id,
                website_id = ?self.website_id.map(|w| w.value()),
                "Backfill skipped: website already pushed"
            );
            return;
        }

        tracing::info!(
            store_id = %self.store_id,
            website_id = ?self.website_id.map(|w| w.value()),
            status = %self.status,
            events_queued = self.events_queued,
            batches_built = self.batches_built,
            batches_sent = self.batches_sent,
            attempts = self.attempts,
            rejected_attempts = self.rejected_attempts,
            duration_secs = self.duration.as_secs(),
            "Backfill finished"
        );

        if let Some(error) = &self.error {
            tracing::warn!(
                phase = ?error.phase.map(|p| p.as_str()),
                category = error.category,
                origin = %error.origin,
                message = %error.message,
                "Backfill halted"
            );
        }
    }
}

/// Error that halted a run, flattened for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobError {
    /// Phase that failed; `None` before any phase started
    pub phase: Option<JobPhase>,

    /// Category tag of the root cause
    pub category: &'static str,

    /// Innermost recorded origin, or "unknown"
    pub origin: String,

    /// Error message
    pub message: String,
}

impl JobError {
    pub fn from_error(phase: Option<JobPhase>, error: &StorefeedError) -> Self {
        Self {
            phase,
            category: error.category(),
            origin: error.origin().unwrap_or("unknown").to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportError;

    #[test]
    fn test_summary_creation() {
        let summary = JobSummary::new(StoreId::new(3));

        assert_eq!(summary.store_id, StoreId::new(3));
        assert_eq!(summary.status, PushStatus::NotStarted);
        assert_eq!(summary.duration, Duration::from_secs(0));
        assert!(summary.is_successful());
        assert!(!summary.skipped);
    }

    #[test]
    fn test_summary_with_duration() {
        let summary = JobSummary::new(StoreId::new(1)).with_duration(Duration::from_secs(90));
        assert_eq!(summary.duration, Duration::from_secs(90));
    }

    #[test]
    fn test_fail_records_category_and_origin() {
        let mut summary = JobSummary::new(StoreId::new(1));
        let error = StorefeedError::from(TransportError::Timeout("30s".to_string()))
            .with_origin("AttemptTracker::send(abc)");

        summary.fail(Some(JobPhase::Send), &error);

        assert!(!summary.is_successful());
        assert!(summary.failed_on_transport());
        assert_eq!(summary.status, PushStatus::Failed);
        let recorded = summary.error.unwrap();
        assert_eq!(recorded.phase, Some(JobPhase::Send));
        assert_eq!(recorded.category, "TRANSPORT");
        assert_eq!(recorded.origin, "AttemptTracker::send(abc)");
    }

    #[test]
    fn test_error_without_origin() {
        let error = JobError::from_error(None, &StorefeedError::Validation("bad".to_string()));
        assert_eq!(error.origin, "unknown");
        assert_eq!(error.category, "VALIDATION");
    }
}
