//! Status command implementation
//!
//! This module implements the `status` command for displaying the historical
//! push status, recorded phase and pending work of each website.

use super::{load_checked_config, EXIT_CONFIG, EXIT_CONNECTION, EXIT_FAILED, EXIT_OK};
use crate::adapters::database::{create_pipeline_storage, create_postgres_client};
use crate::core::state::{HistoricalPushStatus, PushStatus, StateManager};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show this website
    #[arg(long)]
    pub website_id: Option<u32>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking push status");

        println!("📊 Historical Push Status");
        println!();

        let Some(mut config) = load_checked_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        // Status always reads the persisted pipeline tables
        config.application.dry_run = false;

        let storage = match create_postgres_client(&config).await {
            Ok(client) => match create_pipeline_storage(&config, &client).await {
                Ok(storage) => storage,
                Err(e) => {
                    println!("❌ Failed to open pipeline storage");
                    println!("   Error: {e}");
                    return Ok(EXIT_CONNECTION);
                }
            },
            Err(e) => {
                println!("❌ Failed to connect to database");
                println!("   Error: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let state_manager = StateManager::new_with_storage(storage.state.clone());
        let statuses = match state_manager.all_push_statuses().await {
            Ok(statuses) => statuses,
            Err(e) => {
                println!("❌ Failed to load push statuses");
                println!("   Error: {e}");
                return Ok(EXIT_FAILED);
            }
        };

        let shown = self.filter(&statuses);
        if shown.is_empty() {
            println!("No backfill history found.");
            println!("Run 'storefeed backfill --store-id <ID>' to push a website.");
            return Ok(EXIT_OK);
        }

        println!("Found {} website(s):", shown.len());
        println!();
        println!(
            "{:<10} {:<18} {:<10} {:<10} {:<10} {:<20}",
            "Website", "Status", "Phase", "Events", "Batches", "Updated"
        );
        println!("{}", "-".repeat(80));

        for status in shown {
            let phase = match state_manager.load_run_state(status.website_id).await {
                Ok(Some(state)) => state.phase.to_string(),
                Ok(None) => "-".to_string(),
                Err(e) => {
                    tracing::warn!(website_id = %status.website_id, error = %e, "Failed to load run state");
                    "?".to_string()
                }
            };
            let pending = storage
                .queue
                .pending_counts(status.website_id)
                .await
                .unwrap_or_default();

            println!(
                "{:<10} {:<18} {:<10} {:<10} {:<10} {:<20}",
                status.website_id,
                status_label(status.status),
                phase,
                pending.unbatched_events,
                pending.unsent_batches,
                status.updated_at.format("%Y-%m-%d %H:%M:%S")
            );
        }

        println!();
        Ok(EXIT_OK)
    }

    fn filter<'a>(&self, statuses: &'a [HistoricalPushStatus]) -> Vec<&'a HistoricalPushStatus> {
        statuses
            .iter()
            .filter(|s| self.website_id.map_or(true, |id| s.website_id.value() == id))
            .collect()
    }
}

fn status_label(status: PushStatus) -> &'static str {
    match status {
        PushStatus::Complete => "✅ Complete",
        PushStatus::InProgress => "🔄 In Progress",
        PushStatus::Failed => "❌ Failed",
        PushStatus::NotStarted => "⏸️  Not Started",
    }
}
