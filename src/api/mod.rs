//! Remote backend boundary.
//!
//! The sync engine talks to the backend only through the two traits defined
//! here. Implementations:
//!
//! - **[`RestClient`]**: JSON over HTTP against the configured backend, with the
//!   session cached on disk between runs
//! - **[`MemoryRemote`]** / **[`MemoryAuth`]**: in-process backend used by tests
//! - **[`Disconnected`]**: stand-in used when no backend is configured; every
//!   remote call fails and the identity is always `None`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eisen::api::{AuthProvider, MemoryAuth};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let auth = MemoryAuth::new();
//! let mut rx = auth.subscribe();
//! auth.sign_up("a@b.com", "secret").await?;
//! rx.changed().await?;
//! assert!(rx.borrow().is_some());
//! # Ok(())
//! # }
//! ```

use crate::libs::messages::Message;
use crate::libs::task::{Project, ProjectPatch, Task, TaskPatch};
use crate::msg_bail_anyhow;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub mod memory;
pub mod rest;

pub use memory::{MemoryAuth, MemoryRemote};
pub use rest::RestClient;

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id assigned by the backend.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: &str, email: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            email: email.map(str::to_string),
        }
    }

    /// Email when known, id otherwise.
    pub fn display(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// Per-principal data access. Every call is scoped to the signed-in user.
///
/// Collections come back in the backend's own order; the store re-sorts on
/// read. Projects are created with the client-chosen id, tasks may get a new
/// id from the backend.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Every task of the signed-in user.
    async fn fetch_tasks(&self) -> Result<Vec<Task>>;
    async fn fetch_projects(&self) -> Result<Vec<Project>>;
    /// Inserts a task.
    ///
    /// # Returns
    ///
    /// The stored row. Its id may differ from `task.id`; the caller adopts it.
    async fn create_task(&self, task: &Task) -> Result<Task>;
    /// Applies the set fields of `patch` to the task with `id`.
    ///
    /// # Errors
    ///
    /// Fails when no task has that id, as well as on transport errors.
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task>;
    /// # Errors
    ///
    /// Fails when no task has that id, as well as on transport errors.
    async fn delete_task(&self, id: &str) -> Result<()>;
    async fn create_project(&self, project: &Project) -> Result<Project>;
    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project>;
    async fn delete_project(&self, id: &str) -> Result<()>;
}

/// Account operations plus the identity subscription that drives sync.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Signs in and publishes the identity to subscribers.
    ///
    /// # Errors
    ///
    /// Fails on refused credentials; the published identity is unchanged then.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;
    /// Publishes `None` even when the backend call fails.
    async fn sign_out(&self) -> Result<()>;
    /// Current identity plus every later change; `None` means signed out.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Backend used when nothing is configured.
pub struct Disconnected {
    identity: watch::Sender<Option<Identity>>,
}

impl Disconnected {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self { identity }
    }
}

impl Default for Disconnected {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSource for Disconnected {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn create_task(&self, _task: &Task) -> Result<Task> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn update_task(&self, _id: &str, _patch: &TaskPatch) -> Result<Task> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn delete_task(&self, _id: &str) -> Result<()> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn create_project(&self, _project: &Project) -> Result<Project> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn update_project(&self, _id: &str, _patch: &ProjectPatch) -> Result<Project> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn delete_project(&self, _id: &str) -> Result<()> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }
}

#[async_trait]
impl AuthProvider for Disconnected {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Identity> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Identity> {
        msg_bail_anyhow!(Message::RemoteNotConfigured)
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}
