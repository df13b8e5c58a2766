//! CLI command implementations
//!
//! Commands print human-readable progress and return a process exit code:
//! `0` success, `2` configuration error, `4` connection error, `5` failure.

pub mod attributes;
pub mod backfill;
pub mod status;
pub mod validate;

use crate::config::{MappingConfig, StorefeedConfig};
use crate::core::mapping::{mapping_source_for, FieldMapper, InMemoryMappingCache};
use std::sync::Arc;

pub(crate) const EXIT_OK: i32 = 0;
pub(crate) const EXIT_CONFIG: i32 = 2;
pub(crate) const EXIT_CONNECTION: i32 = 4;
pub(crate) const EXIT_FAILED: i32 = 5;

/// Field mapper over the configured mapping definition
pub(crate) fn build_mapper(config: &MappingConfig) -> Arc<FieldMapper> {
    Arc::new(FieldMapper::new(
        mapping_source_for(config),
        Arc::new(InMemoryMappingCache::new()),
    ))
}

/// Load and validate the configuration, printing the failure
pub(crate) fn load_checked_config(config_path: &str) -> Option<StorefeedConfig> {
    match crate::config::load_config(config_path) {
        Ok(config) => Some(config),
        Err(e) => {
            println!("❌ Failed to load configuration file");
            println!("   Error: {e}");
            None
        }
    }
}
