//! # Adboard Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database: the synced daily metrics, the per-ad monitor rows,
//! users with their sessions and settings, and the team colour rules.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** This crate encapsulates all database-specific logic. It
//!   provides a clean API to the rest of the application and hides the SQL.
//! - **Fixed statements:** Every query is a fixed statement with bound
//!   parameters. Optional filters and partial updates are expressed in SQL
//!   (`$n IS NULL OR ...`, `COALESCE($n, column)`), never by building column
//!   names from input.
//! - **Asynchronous & Pooled:** All operations are asynchronous and share a
//!   connection pool (`PgPool`). Batch writes run in a single transaction.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded migrations.
//! - `DbRepository`: Holds the pool and provides all data access methods.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{
    ActivityLogEntry, AdMetricsRow, DbRepository, DbUser, MonitorFilter, TeamColorSetting,
    UserPresence,
};
