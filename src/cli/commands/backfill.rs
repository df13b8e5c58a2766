//! Backfill command implementation
//!
//! This module implements the `backfill` command, which runs the historical
//! backfill job for the website owning a store.

use super::{
    build_mapper, load_checked_config, EXIT_CONFIG, EXIT_CONNECTION, EXIT_FAILED, EXIT_OK,
};
use crate::adapters::api::{ApiTransport, DryRunTransport, HttpTransport};
use crate::adapters::database::{
    create_pipeline_storage, create_postgres_client, create_record_source,
};
use crate::adapters::source::NoSession;
use crate::core::export::{
    AttemptTracker, BackfillSettings, EventAssembler, HistoricalBackfillJob, JobSummary,
};
use crate::domain::StoreId;
use crate::logging::init_logging_from_config;
use clap::Args;
use std::sync::Arc;

/// Arguments for the backfill command
#[derive(Args, Debug)]
pub struct BackfillArgs {
    /// Store whose website is backfilled
    #[arg(long)]
    pub store_id: u32,

    /// Push again even if the website was pushed completely before
    #[arg(long)]
    pub force: bool,

    /// Convert and batch without persisting or sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Ignore a recorded phase and start over from convert
    #[arg(long)]
    pub restart: bool,
}

impl BackfillArgs {
    /// Execute the backfill command
    ///
    /// Logging is installed here, from the loaded configuration, so the
    /// run reaches the configured file sink. `log_level` overrides
    /// `application.log_level`.
    pub async fn execute(
        &self,
        config_path: &str,
        log_level: Option<&str>,
    ) -> anyhow::Result<i32> {
        let Some(mut config) = load_checked_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };

        let _logging_guard = match init_logging_from_config(log_level, &config) {
            Ok(guard) => guard,
            Err(e) => {
                println!("❌ Failed to initialize logging");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            config_path = %config_path,
            store_id = self.store_id,
            "Starting backfill"
        );

        if self.dry_run {
            config.application.dry_run = true;
        }
        if self.restart {
            config.export.resume_phases = false;
        }

        if config.application.dry_run {
            println!("🔍 DRY RUN: nothing will be persisted or sent");
        }

        let client = match create_postgres_client(&config).await {
            Ok(client) => client,
            Err(e) => {
                println!("❌ Failed to connect to database");
                println!("   Error: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let storage = match create_pipeline_storage(&config, &client).await {
            Ok(storage) => storage,
            Err(e) => {
                println!("❌ Failed to prepare pipeline storage");
                println!("   Error: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let transport: Arc<dyn ApiTransport> = if config.application.dry_run {
            Arc::new(DryRunTransport)
        } else {
            match HttpTransport::new(&config.api) {
                Ok(transport) => Arc::new(transport),
                Err(e) => {
                    println!("❌ Failed to create API client");
                    println!("   Error: {e}");
                    return Ok(EXIT_CONFIG);
                }
            }
        };
        tracing::info!(transport = %transport.describe(), "Transport ready");

        let source = create_record_source(&config, &client);
        let assembler = EventAssembler::new(
            build_mapper(&config.mapping),
            source.clone(),
            source.clone(),
            source.clone(),
            Arc::new(NoSession),
        );
        let tracker = AttemptTracker::new(transport, storage.attempts.clone());

        let job = HistoricalBackfillJob::new(
            BackfillSettings::from_config(&config),
            source.clone(),
            source,
            assembler,
            storage,
            tracker,
        );

        let summary = job.perform(StoreId::new(self.store_id), self.force).await;
        print_summary(&summary);

        Ok(exit_code(&summary))
    }
}

fn exit_code(summary: &JobSummary) -> i32 {
    if summary.is_successful() {
        EXIT_OK
    } else if summary.failed_on_transport() {
        EXIT_CONNECTION
    } else {
        EXIT_FAILED
    }
}

fn print_summary(summary: &JobSummary) {
    println!();
    if summary.skipped {
        println!(
            "⏭️  Website already pushed completely, nothing to do (use --force to push again)"
        );
        return;
    }

    match &summary.error {
        None => println!("✅ Backfill completed"),
        Some(error) => {
            println!("❌ Backfill failed");
            if let Some(phase) = error.phase {
                println!("   Phase: {phase}");
            }
            println!("   Category: {}", error.category);
            println!("   Origin: {}", error.origin);
            println!("   Error: {}", error.message);
        }
    }

    if let Some(website_id) = summary.website_id {
        println!("  Website: {website_id}");
    }
    println!("  Events queued: {}", summary.events_queued);
    println!("  Batches built: {}", summary.batches_built);
    println!(
        "  Batches sent: {} ({} attempts, {} rejected)",
        summary.batches_sent, summary.attempts, summary.rejected_attempts
    );
    println!("  Duration: {:.1}s", summary.duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::JobPhase;
    use crate::domain::{FormattingError, StorefeedError, TransportError};

    #[test]
    fn test_exit_code_success() {
        let summary = JobSummary::new(StoreId::new(1));
        assert_eq!(exit_code(&summary), EXIT_OK);
    }

    #[test]
    fn test_exit_code_transport_fault() {
        let mut summary = JobSummary::new(StoreId::new(1));
        summary.fail(
            Some(JobPhase::Send),
            &StorefeedError::from(TransportError::ConnectionFailed(
                "connection refused".to_string(),
            )),
        );
        assert_eq!(exit_code(&summary), EXIT_CONNECTION);
    }

    #[test]
    fn test_exit_code_other_failure() {
        let mut summary = JobSummary::new(StoreId::new(1));
        summary.fail(
            Some(JobPhase::Convert),
            &StorefeedError::from(FormattingError::InvalidDate("0000-00-00".to_string())),
        );
        assert_eq!(exit_code(&summary), EXIT_FAILED);
    }
}
