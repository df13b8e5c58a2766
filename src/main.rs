// Storefeed - store history export to an analytics ingestion API
// Copyright (c) 2026 Storefeed Contributors
// Licensed under the MIT License

use clap::Parser;
use std::process;
use storefeed::cli::{Cli, Commands};
use storefeed::config::LoggingConfig;
use storefeed::logging::init_logging;

/// Exit code after an interrupt, as shells report SIGINT
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // The backfill installs logging from its configuration; the other
    // commands log to the console only
    let logging_guard = match &cli.command {
        Commands::Backfill(_) => None,
        _ => {
            let log_level = cli.log_level.as_deref().unwrap_or("info");
            let logging_config = LoggingConfig {
                local_enabled: false,
                ..LoggingConfig::default()
            };
            match init_logging(log_level, &logging_config) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    eprintln!("Failed to initialize logging: {e}");
                    process::exit(5);
                }
            }
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Storefeed - store history export"
    );

    let exit_code = tokio::select! {
        result = execute_command(&cli) => match result {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %e, "Command execution failed");
                eprintln!("Error: {e}");
                5
            }
        },
        _ = shutdown_signal() => {
            tracing::warn!("Interrupted; a resumed backfill continues at its recorded phase");
            println!("\n⚠️  Interrupted. Run the backfill again to resume.");
            EXIT_INTERRUPTED
        }
    };

    drop(logging_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Backfill(args) => {
            args.execute(&cli.config, cli.log_level.as_deref())
                .await
        }
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Attributes(args) => args.execute(&cli.config).await,
    }
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT (Ctrl+C)"),
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
