//! Domain models and types for Storefeed.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`WebsiteId`], [`StoreId`], [`BatchId`], [`AttemptId`])
//! - **Store input** ([`RawRecord`])
//! - **Event model** ([`NormalizedEvent`], [`MappedField`], [`FieldValue`])
//! - **Sub-objects** ([`Customer`], [`CatalogRef`], [`Visit`], [`Cookies`])
//! - **Transmission log** ([`Attempt`], [`BatchError`])
//! - **Error types** ([`StorefeedError`], [`MappingError`], [`FormattingError`], [`TransportError`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, StorefeedError>`]:
//!
//! ```rust
//! use storefeed::domain::{Result, StoreId};
//! use std::str::FromStr;
//!
//! fn parse(input: &str) -> Result<StoreId> {
//!     StoreId::from_str(input).map_err(storefeed::domain::StorefeedError::Validation)
//! }
//! # assert!(parse("1").is_ok());
//! ```

pub mod attempt;
pub mod entities;
pub mod errors;
pub mod event;
pub mod ids;
pub mod record;
pub mod result;

pub use attempt::{Attempt, BatchError, NewAttempt, HTTP_OK};
pub use entities::{CatalogRef, Cookies, Customer, Visit};
pub use errors::{FormattingError, MappingError, StorefeedError, TransportError};
pub use event::{FieldValue, MappedField, NormalizedEvent};
pub use ids::{AttemptId, BatchId, StoreId, WebsiteId};
pub use record::RawRecord;
pub use result::Result;
