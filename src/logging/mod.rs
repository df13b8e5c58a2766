//! Logging and observability
//!
//! Structured logging through `tracing`, plus macros that emit the fields the
//! backfill job tags its records with (`phase`, `category`, `origin`).
//!
//! # Example
//!
//! ```no_run
//! use storefeed::logging::init_logging;
//! use storefeed::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(website_id = 1, "Backfill started");
//! ```

pub mod structured;

pub use structured::{
    effective_log_level, init_logging, init_logging_from_config, parse_log_level, LoggingGuard,
    LOG_FILE_NAME,
};

/// Log the start of a job phase
///
/// # Example
///
/// ```no_run
/// use storefeed::log_phase_start;
///
/// log_phase_start!("convert", 1);
/// ```
#[macro_export]
macro_rules! log_phase_start {
    ($phase:expr, $website_id:expr) => {
        tracing::info!(
            phase = %$phase,
            website_id = %$website_id,
            "Starting phase"
        );
    };
}

/// Log a [`StorefeedError`](crate::domain::StorefeedError) with its category
/// and origin tags
///
/// # Example
///
/// ```no_run
/// use storefeed::log_error_with_context;
/// use storefeed::domain::StorefeedError;
///
/// let error = StorefeedError::State("run state missing".to_string())
///     .with_origin("HistoricalBackfillJob::perform");
/// log_error_with_context!(&error, "Backfill phase failed");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            category = $error.category(),
            origin = $error.origin().unwrap_or("unknown"),
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use storefeed::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "HTTP 503");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
