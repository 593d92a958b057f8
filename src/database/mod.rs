//! # Database
//!
//! Connection pooling and schema migrations for the Postgres project store.
//! Queries are built at runtime, so the crate compiles without a live database.

pub mod connection;

pub use connection::DatabaseConnection;
