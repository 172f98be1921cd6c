//! Core library modules.
//!
//! ## Usage
//!
//! ```rust
//! use eisen::libs::quadrant::Quadrant;
//! use eisen::libs::store::{AddTaskOptions, TaskStore};
//!
//! let mut store = TaskStore::new(false);
//! store.add_task("Book flights", AddTaskOptions::quadrant(Quadrant::Important));
//! let groups = store.snapshot().grouped();
//! assert_eq!(groups.get(Quadrant::Important).len(), 1);
//! ```

pub mod app;
pub mod config;
pub mod data_storage;
pub mod messages;
pub mod ordering;
pub mod persistence;
pub mod quadrant;
pub mod store;
pub mod sync;
pub mod task;
pub mod undo;
pub mod view;
