//! Declarative field mapping
//!
//! This module turns raw store records into normalized events:
//! - [`definition`] - the mapping table model and its loader
//! - [`cache`] - the injected definition cache
//! - [`source`] - where the definition text comes from
//! - [`coerce`] - per-type value coercion
//! - [`mapper`] - the [`FieldMapper`] tying them together

pub mod cache;
pub mod coerce;
pub mod definition;
pub mod mapper;
pub mod source;

pub use cache::{InMemoryMappingCache, MappingCache, MAPPING_CACHE_KEY, MAPPING_CACHE_TAG};
pub use definition::{ElementKey, FieldType, MappingDefinition, MappingEntry, SourceField};
pub use mapper::FieldMapper;
pub use source::{
    mapping_source_for, EmbeddedMappingSource, FileMappingSource, InlineMappingSource,
    MappingSource,
};
