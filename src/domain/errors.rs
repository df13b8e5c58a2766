//! Domain error types
//!
//! This module defines the error hierarchy for Storefeed. Component errors
//! (mapping, formatting, transport) are typed so callers can tell a fatal
//! definition problem from a bad record or a network fault, and none of them
//! expose third-party types.

use thiserror::Error;

/// Main Storefeed error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum StorefeedError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Field mapping definition errors
    #[error("Field mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Record or entity formatting errors
    #[error("Formatting error: {0}")]
    Formatting(#[from] FormattingError),

    /// Network-level transport faults
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(String),

    /// Job state management errors
    #[error("State management error: {0}")]
    State(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// An error re-raised at a component boundary with its origin attached
    #[error("{origin}: {source}")]
    Context {
        /// Component operation where the error was caught
        origin: String,
        /// Underlying error
        #[source]
        source: Box<StorefeedError>,
    },
}

impl StorefeedError {
    /// Wrap this error with the operation it was caught in
    pub fn with_origin(self, origin: impl Into<String>) -> Self {
        StorefeedError::Context {
            origin: origin.into(),
            source: Box::new(self),
        }
    }

    /// Log category tag for this error
    ///
    /// Context wrappers report the category of the innermost error.
    pub fn category(&self) -> &'static str {
        match self {
            StorefeedError::Configuration(_) => "CONFIGURATION",
            StorefeedError::Mapping(_) => "FIELD MAPPING",
            StorefeedError::Formatting(_) => "FORMATTING",
            StorefeedError::Transport(_) => "TRANSPORT",
            StorefeedError::Database(_) => "DATABASE",
            StorefeedError::State(_) => "STATE",
            StorefeedError::Validation(_) => "VALIDATION",
            StorefeedError::Serialization(_) => "SERIALIZATION",
            StorefeedError::Io(_) => "IO",
            StorefeedError::Context { source, .. } => source.category(),
        }
    }

    /// Innermost origin recorded on this error, if any
    pub fn origin(&self) -> Option<&str> {
        match self {
            StorefeedError::Context { origin, source } => {
                source.origin().or(Some(origin.as_str()))
            }
            _ => None,
        }
    }

    /// Whether the root cause is a network-level transport fault
    pub fn is_transport_fault(&self) -> bool {
        match self {
            StorefeedError::Transport(_) => true,
            StorefeedError::Context { source, .. } => source.is_transport_fault(),
            _ => false,
        }
    }
}

/// Field mapping errors
///
/// Raised when the mapping definition cannot be produced. A mapping
/// operation that hits one of these never returns a partial event.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The canonical mapping source could not be read
    #[error("Mapping source unavailable: {0}")]
    SourceUnavailable(String),

    /// The mapping source could not be parsed
    #[error("Invalid mapping definition: {0}")]
    InvalidDefinition(String),

    /// A source field reference is malformed
    #[error("Invalid source field '{source_field}' for {element}.{local_key}")]
    InvalidSourceField {
        element: String,
        local_key: String,
        source_field: String,
    },

    /// An element key string is malformed
    #[error("Invalid element key: '{0}'")]
    InvalidElementKey(String),

    /// The mapping cache failed
    #[error("Mapping cache failure: {0}")]
    Cache(String),
}

/// Record formatting errors
#[derive(Debug, Error)]
pub enum FormattingError {
    /// A value could not be parsed as a calendar date/time
    #[error("Unparsable date: '{0}'")]
    InvalidDate(String),

    /// The record is missing data the formatter cannot do without
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

/// Transport-level faults
///
/// HTTP status codes are never reported through this type; they are
/// recorded as attempt data.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach the ingestion endpoint
    #[error("Failed to connect to ingestion endpoint: {0}")]
    ConnectionFailed(String),

    /// The request timed out before a response arrived
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for StorefeedError {
    fn from(err: std::io::Error) -> Self {
        StorefeedError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for StorefeedError {
    fn from(err: serde_json::Error) -> Self {
        StorefeedError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for StorefeedError {
    fn from(err: toml::de::Error) -> Self {
        StorefeedError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storefeed_error_display() {
        let err = StorefeedError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_mapping_error_conversion() {
        let err: StorefeedError = MappingError::InvalidDefinition("bad json".to_string()).into();
        assert!(matches!(err, StorefeedError::Mapping(_)));
        assert_eq!(err.category(), "FIELD MAPPING");
    }

    #[test]
    fn test_context_keeps_inner_category_and_origin() {
        let err: StorefeedError = FormattingError::InvalidDate("tomorrow-ish".to_string()).into();
        let err = err
            .with_origin("format_date")
            .with_origin("HistoricalBackfillJob::convert");

        assert_eq!(err.category(), "FORMATTING");
        assert_eq!(err.origin(), Some("format_date"));
        assert!(err.to_string().starts_with("HistoricalBackfillJob::convert: format_date:"));
    }

    #[test]
    fn test_transport_fault_detection() {
        let err: StorefeedError = TransportError::ConnectionFailed("refused".to_string()).into();
        assert!(err.is_transport_fault());
        assert!(err.with_origin("send").is_transport_fault());

        let err = StorefeedError::Database("down".to_string());
        assert!(!err.is_transport_fault());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: StorefeedError = io_err.into();
        assert!(matches!(err, StorefeedError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: StorefeedError = json_err.into();
        assert!(matches!(err, StorefeedError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: StorefeedError = toml_err.into();
        assert!(matches!(err, StorefeedError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_storefeed_error_implements_std_error() {
        let err = StorefeedError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
