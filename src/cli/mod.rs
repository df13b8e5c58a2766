//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Storefeed using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Storefeed - store history export to the analytics API
#[derive(Parser, Debug)]
#[command(name = "storefeed")]
#[command(version, about, long_about = None)]
#[command(author = "Storefeed Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "storefeed.toml", env = "STOREFEED_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "STOREFEED_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Push a website's order and catalog history to the analytics API
    Backfill(commands::backfill::BackfillArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show historical push status per website
    Status(commands::status::StatusArgs),

    /// List the source attributes the mapping reads for an element
    Attributes(commands::attributes::AttributesArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_backfill() {
        let cli = Cli::parse_from(["storefeed", "backfill", "--store-id", "3"]);
        assert_eq!(cli.config, "storefeed.toml");
        match cli.command {
            Commands::Backfill(args) => {
                assert_eq!(args.store_id, 3);
                assert!(!args.force);
                assert!(!args.dry_run);
            }
            other => panic!("expected backfill, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_backfill_requires_store() {
        assert!(Cli::try_parse_from(["storefeed", "backfill"]).is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from([
            "storefeed",
            "--config",
            "custom.toml",
            "backfill",
            "--store-id",
            "1",
            "--force",
        ]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Backfill(ref a) if a.force));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["storefeed", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["storefeed", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["storefeed", "status", "--website-id", "2"]);
        assert!(matches!(cli.command, Commands::Status(ref a) if a.website_id == Some(2)));
    }

    #[test]
    fn test_cli_parse_attributes() {
        let cli = Cli::parse_from(["storefeed", "attributes", "order|items"]);
        assert!(matches!(cli.command, Commands::Attributes(ref a) if a.element == "order|items"));
    }
}
