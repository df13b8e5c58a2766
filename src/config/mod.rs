//! Configuration management for Storefeed.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Storefeed uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `STOREFEED_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation with descriptive messages
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use storefeed::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("storefeed.toml")?;
//!
//! println!("Endpoint: {}", config.api.endpoint);
//! println!("Batch size: {}", config.export.batch_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry run
//! - [`ApiConfig`] - Ingestion endpoint, token, timeout and retry policy
//! - [`ExportConfig`] - Batch size, exported elements, phase resume, resource hints
//! - [`MappingConfig`] - Optional mapping definition file
//! - [`PostgreSQLConfig`] - Database connection
//! - [`SourceConfig`] - Store tables records are read from
//! - [`LoggingConfig`] - Local log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [api]
//! endpoint = "https://events.example.com/v1/batch"
//! token = "${STOREFEED_API_TOKEN}"
//!
//! [api.retry]
//! max_retries = 3
//!
//! [export]
//! batch_size = 500
//! elements = ["order", "customer", "product"]
//!
//! [postgresql]
//! connection_string = "${STOREFEED_DATABASE_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApiConfig, ApplicationConfig, ElementTableConfig, ExportConfig, LoggingConfig, MappingConfig,
    PostgreSQLConfig, RetryConfig, SourceConfig, StoreTableConfig, StorefeedConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
