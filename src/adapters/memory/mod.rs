//! In-memory adapters
//!
//! Implementations of the storage and collaborator traits that keep
//! everything in process. Used by dry runs and throughout the tests.

pub mod source;
pub mod storage;

pub use source::{InMemoryStore, StaticSession, ENTITY_ID_FIELD};
pub use storage::InMemoryStorage;
