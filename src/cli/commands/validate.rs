//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Storefeed configuration file and the field mapping it points at.

use super::{build_mapper, EXIT_CONFIG, EXIT_OK};
use crate::config::{load_config, StorefeedConfig};
use crate::core::mapping::ElementKey;
use crate::domain::Result;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = check_mapping(&config) {
            println!("❌ Field mapping check failed");
            println!("   Error: {e}");
            return Ok(EXIT_CONFIG);
        }
        println!("✅ Field mapping covers every exported element");

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  API Endpoint: {}", config.api.endpoint);
        println!("  API Timeout: {}s", config.api.timeout_seconds);
        println!(
            "  Retries: {} (initial {}ms, max {}ms, x{})",
            config.api.retry.max_retries,
            config.api.retry.initial_delay_ms,
            config.api.retry.max_delay_ms,
            config.api.retry.backoff_multiplier
        );
        println!("  Batch Size: {}", config.export.batch_size);
        println!("  Elements: {:?}", config.export.elements);
        println!("  Resume Phases: {}", config.export.resume_phases);
        println!(
            "  Mapping: {}",
            config
                .mapping
                .definition_path
                .as_deref()
                .unwrap_or("built-in default")
        );
        println!(
            "  PostgreSQL Connection: {}",
            config
                .postgresql
                .connection_string
                .expose_secret()
                .as_ref()
                .rsplit('@')
                .next()
                .unwrap_or("***")
        );
        println!("  Max Connections: {}", config.postgresql.max_connections);
        println!("  Store Table: {}", config.source.store.table);
        println!();
        Ok(EXIT_OK)
    }
}

/// Every exported element must be mapped, and each of its sub-elements
/// needs a source table
fn check_mapping(config: &StorefeedConfig) -> Result<()> {
    let mapper = build_mapper(&config.mapping);
    for element in &config.export.elements {
        mapper.require_element(element)?;
        for sub in mapper.sub_elements(element)? {
            let key = ElementKey::composite(element.as_str(), sub.as_str());
            if config.source.table_for(&key).is_none() {
                return Err(crate::domain::StorefeedError::Configuration(format!(
                    "mapping defines '{key}' but source.elements has no table for it"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const MINIMAL: &str = r#"
        [api]
        endpoint = "https://ingest.example.com/v1/batch"
        token = "secret-token"

        [postgresql]
        connection_string = "postgresql://shop:pw@localhost:5432/shop"
    "#;

    #[test]
    fn test_validate_args_creation() {
        let args = ValidateArgs {};
        let _ = format!("{args:?}");
    }

    #[test]
    fn test_default_mapping_passes() {
        let config = parse_config(MINIMAL).unwrap();
        check_mapping(&config).unwrap();
    }

    #[test]
    fn test_missing_sub_element_table_fails() {
        let mut config = parse_config(MINIMAL).unwrap();
        config.source.elements.remove("order|items");
        let err = check_mapping(&config).unwrap_err();
        assert_eq!(err.category(), "CONFIGURATION");
    }

    #[tokio::test]
    async fn test_execute_reports_missing_file() {
        let code = ValidateArgs {}
            .execute("/nonexistent/storefeed.toml")
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
