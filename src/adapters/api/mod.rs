//! Analytics ingestion API integration
//!
//! Batches leave the process through an [`ApiTransport`]: the
//! [`HttpTransport`] in production, or the [`DryRunTransport`] when the
//! application runs with `dry_run`.

pub mod client;

pub use client::{ApiTransport, DryRunTransport, HttpTransport, TransportResponse};
