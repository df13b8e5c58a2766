//! Batch transmission and the attempt log
//!
//! [`AttemptTracker::send`] performs one POST and records what came back.
//! [`RetryPolicy`] decides whether and when the caller tries again.

use super::batch::Batch;
use crate::adapters::api::ApiTransport;
use crate::adapters::database::traits::AttemptStorage;
use crate::config::RetryConfig;
use crate::domain::{Attempt, NewAttempt, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sends batches and appends one attempt per response
pub struct AttemptTracker {
    transport: Arc<dyn ApiTransport>,
    attempts: Arc<dyn AttemptStorage + Send + Sync>,
}

impl AttemptTracker {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        attempts: Arc<dyn AttemptStorage + Send + Sync>,
    ) -> Self {
        Self {
            transport,
            attempts,
        }
    }

    /// POST a batch once and record the attempt
    ///
    /// A non-200 answer is recorded together with an error row holding the
    /// response body, and returned as an ordinary [`Attempt`].
    ///
    /// # Errors
    ///
    /// Returns the transport fault when no response was received; nothing is
    /// recorded in that case. Storage failures are also returned.
    pub async fn send(&self, batch: &Batch) -> Result<Attempt> {
        let payload = batch.to_payload();

        let started = Instant::now();
        let response = self
            .transport
            .post_batch(&payload)
            .await
            .map_err(|e| e.with_origin(format!("AttemptTracker::send({})", batch.id)))?;
        let total_time = started.elapsed().as_secs_f64();

        let attempt = self
            .attempts
            .record_attempt(NewAttempt {
                batch_id: batch.id,
                http_code: response.status,
                total_time,
                created_dt: Utc::now(),
            })
            .await?;

        if attempt.is_success() {
            tracing::info!(
                batch_id = %batch.id,
                events = batch.len(),
                total_time,
                "Batch accepted"
            );
        } else {
            self.attempts
                .record_error(attempt.id, &response.body)
                .await?;
            tracing::warn!(
                batch_id = %batch.id,
                http_code = attempt.http_code,
                attempt_id = %attempt.id,
                "Batch rejected"
            );
        }

        Ok(attempt)
    }
}

/// Exponential backoff between attempts of a rejected batch
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let max_ms = self.max_delay.as_millis() as f64;
        Duration::from_millis(delay_ms.min(max_ms) as u64)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
        }
    }
}

/// Send a batch, retrying rejected attempts per `policy`
///
/// Returns every attempt made, in order. The last one is the final outcome.
///
/// # Errors
///
/// A transport fault on any attempt aborts immediately.
pub async fn send_with_retry(
    tracker: &AttemptTracker,
    batch: &Batch,
    policy: &RetryPolicy,
) -> Result<Vec<Attempt>> {
    let mut attempts = Vec::with_capacity(policy.max_retries + 1);
    let mut retry = 0;

    loop {
        let attempt = tracker.send(batch).await?;
        let accepted = attempt.is_success();
        let http_code = attempt.http_code;
        attempts.push(attempt);

        if accepted || retry >= policy.max_retries {
            return Ok(attempts);
        }

        retry += 1;
        crate::log_retry_attempt!(retry, policy.max_retries, format!("HTTP {http_code}"));
        tokio::time::sleep(policy.delay_for(retry)).await;
    }
}
