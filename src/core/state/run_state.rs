//! Backfill run state and historical push status
//!
//! A [`JobRunState`] records where a website's backfill stands so a later
//! invocation can pick it up. [`HistoricalPushStatus`] is the coarse,
//! operator-facing outcome per website.

use crate::domain::{StoreId, StorefeedError, WebsiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backfill phases in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Map store records into queued events
    Convert,
    /// Group queued events into batches
    Batch,
    /// Transmit unsent batches
    Send,
    /// Nothing left to do
    Complete,
}

impl JobPhase {
    /// Phase that follows this one; `Complete` is terminal
    pub fn next(self) -> Self {
        match self {
            JobPhase::Convert => JobPhase::Batch,
            JobPhase::Batch => JobPhase::Send,
            JobPhase::Send | JobPhase::Complete => JobPhase::Complete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Convert => "convert",
            JobPhase::Batch => "batch",
            JobPhase::Send => "send",
            JobPhase::Complete => "complete",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobPhase {
    type Err = StorefeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "convert" => Ok(JobPhase::Convert),
            "batch" => Ok(JobPhase::Batch),
            "send" => Ok(JobPhase::Send),
            "complete" => Ok(JobPhase::Complete),
            other => Err(StorefeedError::State(format!("Unknown job phase '{other}'"))),
        }
    }
}

/// Persisted progress of a website's backfill
///
/// `phase` is the next phase to run, so a state whose phase is `Send` has
/// finished converting and batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRunState {
    pub website_id: WebsiteId,
    pub store_ids: Vec<StoreId>,
    pub phase: JobPhase,
    pub updated_at: DateTime<Utc>,
}

impl JobRunState {
    /// A run that has not converted anything yet
    pub fn new(website_id: WebsiteId, store_ids: Vec<StoreId>) -> Self {
        Self {
            website_id,
            store_ids,
            phase: JobPhase::Convert,
            updated_at: Utc::now(),
        }
    }

    /// Records that `completed` finished; the state moves to the phase after it
    pub fn advance_past(&mut self, completed: JobPhase) {
        self.phase = completed.next();
        self.updated_at = Utc::now();
    }

    pub fn is_complete(&self) -> bool {
        self.phase == JobPhase::Complete
    }
}

/// Outcome of a website's historical push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushStatus {
    #[default]
    NotStarted,
    InProgress,
    Complete,
    Failed,
}

impl PushStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushStatus::NotStarted => "not_started",
            PushStatus::InProgress => "in_progress",
            PushStatus::Complete => "complete",
            PushStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PushStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PushStatus {
    type Err = StorefeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(PushStatus::NotStarted),
            "in_progress" => Ok(PushStatus::InProgress),
            "complete" => Ok(PushStatus::Complete),
            "failed" => Ok(PushStatus::Failed),
            other => Err(StorefeedError::State(format!(
                "Unknown push status '{other}'"
            ))),
        }
    }
}

/// Historical push status of one website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPushStatus {
    pub website_id: WebsiteId,
    pub status: PushStatus,
    pub updated_at: DateTime<Utc>,
}

impl HistoricalPushStatus {
    pub fn new(website_id: WebsiteId, status: PushStatus) -> Self {
        Self {
            website_id,
            status,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert_eq!(JobPhase::Convert.next(), JobPhase::Batch);
        assert_eq!(JobPhase::Batch.next(), JobPhase::Send);
        assert_eq!(JobPhase::Send.next(), JobPhase::Complete);
        assert_eq!(JobPhase::Complete.next(), JobPhase::Complete);
        assert!(JobPhase::Convert < JobPhase::Send);
    }

    #[test]
    fn test_phase_round_trips_through_text() {
        for phase in [
            JobPhase::Convert,
            JobPhase::Batch,
            JobPhase::Send,
            JobPhase::Complete,
        ] {
            assert_eq!(phase.as_str().parse::<JobPhase>().unwrap(), phase);
        }
        assert!("done".parse::<JobPhase>().is_err());
    }

    #[test]
    fn test_run_state_advance() {
        let mut state = JobRunState::new(WebsiteId::new(1), vec![StoreId::new(1)]);
        assert_eq!(state.phase, JobPhase::Convert);

        state.advance_past(JobPhase::Convert);
        assert_eq!(state.phase, JobPhase::Batch);

        state.advance_past(JobPhase::Send);
        assert!(state.is_complete());
    }

    #[test]
    fn test_push_status_serde() {
        let status = HistoricalPushStatus::new(WebsiteId::new(2), PushStatus::InProgress);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["website_id"], 2);
        assert_eq!("failed".parse::<PushStatus>().unwrap(), PushStatus::Failed);
        assert_eq!(PushStatus::default(), PushStatus::NotStarted);
    }
}
