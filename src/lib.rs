// Storefeed - store history export to an analytics ingestion API
// Copyright (c) 2026 Storefeed Contributors
// Licensed under the MIT License

//! # Storefeed - store history export
//!
//! Storefeed maps e-commerce store data (orders, customers, products) into
//! the event format of an analytics ingestion API and pushes a website's
//! history to it in batches.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Mapping** raw store records to API fields through a JSON field map
//! - **Formatting** dates, customers, catalogs and visits
//! - **Batching** queued events into bounded payloads
//! - **Sending** batches and recording every attempt and rejection
//! - **Resuming** an interrupted backfill at its recorded phase
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (mapping, formatting, export, state)
//! - [`adapters`] - External integrations (store tables, PostgreSQL, HTTP API)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefeed::config::load_config;
//! use storefeed::core::mapping::{mapping_source_for, ElementKey, FieldMapper, InMemoryMappingCache};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("storefeed.toml")?;
//!
//!     let mapper = FieldMapper::new(
//!         mapping_source_for(&config.mapping),
//!         Arc::new(InMemoryMappingCache::new()),
//!     );
//!     let columns = mapper.attributes_to_select(&ElementKey::simple("order"))?;
//!     println!("Order columns: {columns:?}");
//!     Ok(())
//! }
//! ```
//!
//! See [`core`] for wiring a complete backfill job.
//!
//! ## Error Handling
//!
//! Storefeed uses [`domain::StorefeedError`] for all library errors. A
//! backfill never returns one: [`core::export::HistoricalBackfillJob::perform`]
//! logs the error with its category and origin and reports it in the
//! summary.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
