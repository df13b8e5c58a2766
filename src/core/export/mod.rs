//! Export pipeline and the historical backfill job
//!
//! This module provides the core export logic for Storefeed, including:
//! - Event assembly from store records
//! - Batch building
//! - Batch transmission with attempt tracking and retries
//! - The backfill job that drives them, and its summary

pub mod assembler;
pub mod attempt;
pub mod batch;
pub mod job;
pub mod summary;

pub use assembler::EventAssembler;
pub use attempt::{send_with_retry, AttemptTracker, RetryPolicy};
pub use batch::{build_batches, Batch};
pub use job::{BackfillSettings, HistoricalBackfillJob};
pub use summary::{JobError, JobSummary};
