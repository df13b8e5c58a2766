//! PostgreSQL integration
//!
//! A pooled client shared by the pipeline storage adapter and the store
//! record source, plus the row models of the pipeline tables.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
