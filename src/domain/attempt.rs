//! Transmission attempts and their errors
//!
//! Attempts form an append-only log: one row per POST that produced a
//! response, retries included. An error row exists exactly when the attempt's
//! status code is not 200.

use super::ids::{AttemptId, BatchId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP status code the ingestion API returns for an accepted batch
pub const HTTP_OK: u16 = 200;

/// An attempt before it has been stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttempt {
    pub batch_id: BatchId,
    pub http_code: u16,
    /// Elapsed seconds for the request
    pub total_time: f64,
    pub created_dt: DateTime<Utc>,
}

impl NewAttempt {
    /// Whether the API accepted the batch
    pub fn is_success(&self) -> bool {
        self.http_code == HTTP_OK
    }
}

/// A stored attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub batch_id: BatchId,
    pub http_code: u16,
    pub total_time: f64,
    pub created_dt: DateTime<Utc>,
}

impl Attempt {
    /// Combines a new attempt with the id storage assigned to it
    pub fn from_new(id: AttemptId, attempt: NewAttempt) -> Self {
        Self {
            id,
            batch_id: attempt.batch_id,
            http_code: attempt.http_code,
            total_time: attempt.total_time,
            created_dt: attempt.created_dt,
        }
    }

    /// Whether the API accepted the batch
    pub fn is_success(&self) -> bool {
        self.http_code == HTTP_OK
    }
}

/// Diagnostic detail for a rejected attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    pub attempt_id: AttemptId,
    pub details: String,
    pub created_dt: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_success_only_for_200() {
        let new = NewAttempt {
            batch_id: BatchId::generate(),
            http_code: 200,
            total_time: 0.12,
            created_dt: Utc::now(),
        };
        assert!(new.is_success());

        let attempt = Attempt::from_new(
            AttemptId::new(1),
            NewAttempt {
                http_code: 201,
                ..new
            },
        );
        assert!(!attempt.is_success());
        assert_eq!(attempt.id.value(), 1);
    }
}
