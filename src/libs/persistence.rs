//! Saving the store between runs.
//!
//! The whole persisted slice lives as one JSON document under [`STATE_KEY`].
//! Each write carries the store revision it was taken at, and a backend refuses
//! a write older than what it already holds, so a slow write from an earlier
//! mutation can never overwrite a newer snapshot.
//!
//! Persisted: tasks, projects, selected project, view mode, compact mode and
//! both filters. Never persisted: the signed-in identity and the undo slot.

use super::messages::Message;
use super::store::{StoreState, ViewMode};
use super::task::{Project, Task, ALL_PROJECT_ID};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Versioned key; bump the suffix when the document shape changes.
pub const STATE_KEY: &str = "@eisen/state:v3";

/// A stored document with the store revision it was written at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: String,
    pub revision: u64,
}

/// Async key-value contract behind [`Persistence`].
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>>;
    /// Stores `value` unless a newer revision is already there. Returns
    /// whether the write was applied.
    async fn set(&self, key: &str, value: &str, revision: u64) -> Result<bool>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, revision: u64) -> Result<bool> {
        let mut entries = self.entries.lock();
        if let Some(current) = entries.get(key) {
            if current.revision > revision {
                return Ok(false);
            }
        }
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                revision,
            },
        );
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

fn all_project_id() -> String {
    ALL_PROJECT_ID.to_string()
}

/// The part of [`StoreState`] that is saved between runs.
///
/// Identity and the undo slot are left out: the identity comes back from the
/// auth provider and the undo window does not outlive the process. Every
/// field has a default so older documents still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default = "all_project_id")]
    pub selected_project_id: String,
    #[serde(default)]
    pub view_mode: ViewMode,
    /// Absent in documents written before the setting existed; the
    /// configured default applies then.
    #[serde(default)]
    pub compact_mode: Option<bool>,
    #[serde(default)]
    pub filter_important: bool,
    #[serde(default)]
    pub filter_urgent: bool,
}

impl PersistedState {
    pub fn from_state(state: &StoreState) -> Self {
        Self {
            tasks: state.tasks.clone(),
            projects: state.projects.clone(),
            selected_project_id: state.selected_project_id.clone(),
            view_mode: state.view_mode,
            compact_mode: Some(state.compact_mode),
            filter_important: state.filter_important,
            filter_urgent: state.filter_urgent,
        }
    }

    /// Writes the slice over `state`. An empty project list keeps the
    /// reserved defaults.
    pub fn apply(self, state: &mut StoreState) {
        state.tasks = self.tasks;
        if !self.projects.is_empty() {
            state.projects = self.projects;
        }
        state.selected_project_id = self.selected_project_id;
        state.view_mode = self.view_mode;
        if let Some(compact_mode) = self.compact_mode {
            state.compact_mode = compact_mode;
        }
        state.filter_important = self.filter_important;
        state.filter_urgent = self.filter_urgent;
    }
}

#[derive(Debug, Clone)]
pub struct Loaded {
    pub state: PersistedState,
    pub revision: u64,
}

/// Serializes store snapshots into a [`StateStorage`] under [`STATE_KEY`].
#[derive(Clone)]
pub struct Persistence {
    storage: Arc<dyn StateStorage>,
}

impl Persistence {
    /// Wraps a storage backend. Cheap to clone; clones share the backend.
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self { storage }
    }

    /// Reads the saved slice, `None` on first run.
    ///
    /// # Errors
    ///
    /// Fails when the storage cannot be read or the document does not parse.
    /// Callers treat that as a first run.
    pub async fn load(&self) -> Result<Option<Loaded>> {
        let Some(stored) = self.storage.get(STATE_KEY).await? else {
            return Ok(None);
        };
        let state: PersistedState = serde_json::from_str(&stored.value)?;
        debug!(revision = stored.revision, tasks = state.tasks.len(), "state loaded");
        Ok(Some(Loaded {
            state,
            revision: stored.revision,
        }))
    }

    /// Writes a snapshot now. `Ok(false)` means a newer one was already saved.
    pub async fn write(&self, state: &StoreState, revision: u64) -> Result<bool> {
        let value = serde_json::to_string(&PersistedState::from_state(state))?;
        self.storage.set(STATE_KEY, &value, revision).await
    }

    /// Background write of a snapshot. Failures are logged and dropped.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - State to save; only the persisted slice is written
    /// * `revision` - Store revision of `snapshot`; an older revision than
    ///   the stored one is skipped
    ///
    /// # Returns
    ///
    /// A handle that resolves once the write has been attempted.
    pub fn save(&self, snapshot: Arc<StoreState>, revision: u64) -> JoinHandle<()> {
        let persistence = self.clone();
        tokio::spawn(async move {
            match persistence.write(&snapshot, revision).await {
                Ok(true) => debug!(revision, "state saved"),
                Ok(false) => debug!("{}", Message::StaleWriteSkipped(revision)),
                Err(e) => warn!("{}", Message::StateSaveFailed(e.to_string())),
            }
        })
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove(STATE_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_uses_camel_case_keys() {
        let state = StoreState::new(true);
        let json = serde_json::to_value(PersistedState::from_state(&state)).unwrap();
        assert_eq!(json["selectedProjectId"], "all");
        assert_eq!(json["viewMode"], "list");
        assert_eq!(json["compactMode"], true);
        assert!(json.get("identity").is_none());
        assert!(json.get("lastDeleted").is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: PersistedState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.selected_project_id, ALL_PROJECT_ID);
        assert_eq!(state.view_mode, ViewMode::List);
        assert!(state.compact_mode.is_none());
    }
}
