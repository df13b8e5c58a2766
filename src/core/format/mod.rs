//! Entity formatters
//!
//! Each formatter produces one of the fixed-shape sub-objects attached to
//! events:
//! - [`customer`] - identity resolution and the [`Customer`](crate::domain::Customer) object
//! - [`catalog`] - the store reference
//! - [`visit`] - visit ids and the cookie projection
//! - [`date`] - the ISO-8601 date rendering every formatter shares

pub mod catalog;
pub mod customer;
pub mod date;
pub mod visit;

pub use catalog::CatalogFormatter;
pub use customer::{CustomerFormatter, CUSTOMER_ELEMENT, RESOLUTION_FIELDS};
pub use date::{format_date, format_datetime, parse_date, API_DATE_FORMAT};
pub use visit::{format_cookies, format_visit};
