//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::StorefeedConfig;
use super::secret::secret_string;
use crate::domain::errors::StorefeedError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into StorefeedConfig
/// 4. Applies environment variable overrides (STOREFEED_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read, a referenced
/// environment variable is unset, TOML parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use storefeed::config::loader::load_config;
///
/// let config = load_config("storefeed.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<StorefeedConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(StorefeedError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        StorefeedError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses and validates configuration text
///
/// Applies the same substitution, override and validation steps as
/// [`load_config`].
pub fn parse_config(contents: &str) -> Result<StorefeedConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: StorefeedConfig = toml::from_str(&contents)
        .map_err(|e| StorefeedError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        StorefeedError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| StorefeedError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(StorefeedError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.parse().ok())
}

/// Applies environment variable overrides using the STOREFEED_* prefix
///
/// Environment variables follow the pattern STOREFEED_<SECTION>_<KEY>, for
/// example STOREFEED_API_ENDPOINT or STOREFEED_EXPORT_BATCH_SIZE. Values that
/// fail to parse are ignored.
fn apply_env_overrides(config: &mut StorefeedConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("STOREFEED_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(dry_run) = env_parse("STOREFEED_APPLICATION_DRY_RUN") {
        config.application.dry_run = dry_run;
    }

    // API overrides
    if let Ok(val) = std::env::var("STOREFEED_API_ENDPOINT") {
        config.api.endpoint = val;
    }
    if let Ok(val) = std::env::var("STOREFEED_API_TOKEN") {
        config.api.token = secret_string(val);
    }
    if let Some(timeout) = env_parse("STOREFEED_API_TIMEOUT_SECONDS") {
        config.api.timeout_seconds = timeout;
    }
    if let Some(retries) = env_parse("STOREFEED_API_RETRY_MAX_RETRIES") {
        config.api.retry.max_retries = retries;
    }

    // Export overrides
    if let Some(size) = env_parse("STOREFEED_EXPORT_BATCH_SIZE") {
        config.export.batch_size = size;
    }
    if let Ok(val) = std::env::var("STOREFEED_EXPORT_ELEMENTS") {
        config.export.elements = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(resume) = env_parse("STOREFEED_EXPORT_RESUME_PHASES") {
        config.export.resume_phases = resume;
    }

    // Mapping overrides
    if let Ok(val) = std::env::var("STOREFEED_MAPPING_DEFINITION_PATH") {
        config.mapping.definition_path = Some(val);
    }

    // PostgreSQL overrides
    if let Ok(val) = std::env::var("STOREFEED_POSTGRESQL_CONNECTION_STRING") {
        config.postgresql.connection_string = secret_string(val);
    }
    if let Some(max) = env_parse("STOREFEED_POSTGRESQL_MAX_CONNECTIONS") {
        config.postgresql.max_connections = max;
    }
    if let Ok(val) = std::env::var("STOREFEED_POSTGRESQL_SSL_MODE") {
        config.postgresql.ssl_mode = val;
    }

    // Logging overrides
    if let Some(enabled) = env_parse("STOREFEED_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("STOREFEED_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
