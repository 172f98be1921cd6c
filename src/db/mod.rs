//! SQLite storage.
//!
//! The store's persisted slice is kept as a single JSON document in the
//! `kv_state` table, keyed by the versioned state key.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eisen::db::state::SqliteStorage;
//! use eisen::libs::persistence::Persistence;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let persistence = Persistence::new(Arc::new(SqliteStorage::new()?));
//! let loaded = persistence.load().await?;
//! # Ok(())
//! # }
//! ```

/// Connection setup.
pub mod db;

/// Key-value state table implementing the persistence contract.
pub mod state;
