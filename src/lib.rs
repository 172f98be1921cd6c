//! # Eisen - local-first Eisenhower task manager
//!
//! Tasks are sorted into the important × urgent matrix, grouped into
//! projects, and shown as a list or as four quadrants. Every change is
//! applied locally first, saved to SQLite, and pushed to a remote backend
//! in the background when signed in.
//!
//! ## Layout
//!
//! - [`libs`]: the store, ordering, persistence, sync engine and rendering
//! - [`api`]: the backend boundary and its implementations
//! - [`db`]: SQLite storage for the persisted state
//! - [`commands`]: the `eisen` command line and interactive shell
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eisen::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;
