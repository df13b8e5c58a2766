//! Store-side collaborators
//!
//! Raw records, store and customer lookups, and visitor sessions all belong
//! to the host platform. The pipeline reads them through the traits in
//! [`traits`]; [`postgres`] implements the data side directly over the
//! shop's tables.

pub mod postgres;
pub mod traits;

pub use postgres::PostgresRecordSource;
pub use traits::{
    CustomerDirectory, NoSession, RecordSource, SessionProvider, StoreDirectory, VisitorSession,
};
