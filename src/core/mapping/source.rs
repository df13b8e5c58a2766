//! Canonical mapping sources
//!
//! A source produces the definition text the cache is rebuilt from. The
//! default source is compiled into the binary; deployments can point at a
//! file instead.

use crate::config::MappingConfig;
use crate::domain::{MappingError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Definition shipped with the crate
pub const DEFAULT_MAPPING: &str = include_str!("../../../mapping/default_map.json");

/// Provider of mapping definition text
pub trait MappingSource: Send + Sync {
    /// Reads the definition text
    fn load(&self) -> Result<String>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// The built-in definition
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedMappingSource;

impl MappingSource for EmbeddedMappingSource {
    fn load(&self) -> Result<String> {
        Ok(DEFAULT_MAPPING.to_string())
    }

    fn describe(&self) -> String {
        "embedded default mapping".to_string()
    }
}

/// A definition read from disk on each rebuild
#[derive(Debug, Clone)]
pub struct FileMappingSource {
    path: PathBuf,
}

impl FileMappingSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MappingSource for FileMappingSource {
    fn load(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            MappingError::SourceUnavailable(format!("{}: {e}", self.path.display())).into()
        })
    }

    fn describe(&self) -> String {
        format!("mapping file {}", self.path.display())
    }
}

/// Source selected by configuration: the configured file, else the embedded default
pub fn mapping_source_for(config: &MappingConfig) -> Arc<dyn MappingSource> {
    match &config.definition_path {
        Some(path) => Arc::new(FileMappingSource::new(path)),
        None => Arc::new(EmbeddedMappingSource),
    }
}

/// A definition held in memory
#[derive(Debug, Clone)]
pub struct InlineMappingSource {
    text: String,
}

impl InlineMappingSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl MappingSource for InlineMappingSource {
    fn load(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        "inline mapping".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::definition::{ElementKey, MappingDefinition};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_embedded_default_parses() {
        let text = EmbeddedMappingSource.load().unwrap();
        let definition = MappingDefinition::from_json(&text).unwrap();
        for element in ["order", "customer", "product"] {
            assert!(definition.has_element(element), "missing element {element}");
        }
        assert!(definition
            .entries(&ElementKey::composite("order", "items"))
            .next()
            .is_some());
    }

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"elements": {}}"#).unwrap();
        file.flush().unwrap();

        let source = FileMappingSource::new(file.path());
        assert_eq!(source.load().unwrap(), r#"{"elements": {}}"#);
    }

    #[test]
    fn test_missing_file_is_mapping_error() {
        let source = FileMappingSource::new("/nonexistent/map.json");
        let err = source.load().unwrap_err();
        assert_eq!(err.category(), "FIELD MAPPING");
    }
}
