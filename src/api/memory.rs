//! In-process backend.
//!
//! Behaves like a real backend for a single principal: it keeps its own copy
//! of the collections, can assign its own task ids, and can be switched
//! offline or slowed down to exercise the sync engine's failure paths.

use super::{AuthProvider, Identity, RemoteSource};
use crate::libs::messages::Message;
use crate::libs::task::{Project, ProjectPatch, Task, TaskPatch};
use crate::{msg_bail_anyhow, msg_error_anyhow};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    tasks: Vec<Task>,
    projects: Vec<Project>,
}

/// In-process [`RemoteSource`] with switches for latency, outages and id
/// assignment. Every call is recorded by name.
pub struct MemoryRemote {
    data: Mutex<Collections>,
    calls: Mutex<Vec<String>>,
    assign_ids: bool,
    next_id: AtomicU64,
    offline: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryRemote {
    /// Backend that keeps client-generated task ids.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Collections::default()),
            calls: Mutex::new(Vec::new()),
            assign_ids: false,
            next_id: AtomicU64::new(1),
            offline: AtomicBool::new(false),
            latency: None,
        }
    }

    /// Backend that replaces task ids with its own (`srv-1`, `srv-2`, ...).
    pub fn assigning_ids() -> Self {
        Self {
            assign_ids: true,
            ..Self::new()
        }
    }

    /// Delays every call by `latency` before it takes effect.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replaces the stored collections without recording a call.
    pub fn seed(&self, projects: Vec<Project>, tasks: Vec<Task>) {
        let mut data = self.data.lock();
        data.projects = projects;
        data.tasks = tasks;
    }

    /// While offline every call fails after its latency.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.data.lock().tasks.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.data.lock().projects.clone()
    }

    /// Names of the calls received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    async fn round_trip(&self, call: &str) -> Result<()> {
        self.calls.lock().push(call.to_string());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            anyhow::bail!("{}: backend unreachable", call);
        }
        Ok(())
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSource for MemoryRemote {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        self.round_trip("fetch_tasks").await?;
        let mut tasks = self.data.lock().tasks.clone();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.round_trip("fetch_projects").await?;
        Ok(self.data.lock().projects.clone())
    }

    async fn create_task(&self, task: &Task) -> Result<Task> {
        self.round_trip("create_task").await?;
        let mut created = task.clone();
        if self.assign_ids {
            created.id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        }
        self.data.lock().tasks.push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        self.round_trip("update_task").await?;
        let mut data = self.data.lock();
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| msg_error_anyhow!(Message::TaskNotFound(id.to_string())))?;
        patch.apply(task);
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.round_trip("delete_task").await?;
        let mut data = self.data.lock();
        let before = data.tasks.len();
        data.tasks.retain(|t| t.id != id);
        if data.tasks.len() == before {
            msg_bail_anyhow!(Message::TaskNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn create_project(&self, project: &Project) -> Result<Project> {
        self.round_trip("create_project").await?;
        self.data.lock().projects.push(project.clone());
        Ok(project.clone())
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project> {
        self.round_trip("update_project").await?;
        let mut data = self.data.lock();
        let project = data
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| msg_error_anyhow!(Message::ProjectNotFound(id.to_string())))?;
        if let Some(name) = &patch.name {
            project.name = name.clone();
        }
        if let Some(emoji) = &patch.emoji {
            project.emoji = emoji.clone();
        }
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        self.round_trip("delete_project").await?;
        self.data.lock().projects.retain(|p| p.id != id);
        Ok(())
    }
}

/// Account registry with a live identity channel.
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    identity: watch::Sender<Option<Identity>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            identity,
        }
    }

    /// Starts with a session already established, as after a restored login.
    pub fn signed_in(identity: Identity) -> Self {
        let auth = Self::new();
        auth.identity.send_replace(Some(identity));
        auth
    }

    /// Pushes an identity change as the backend would on token expiry or a
    /// login from elsewhere.
    pub fn emit(&self, identity: Option<Identity>) {
        self.identity.send_replace(identity);
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = {
            let accounts = self.accounts.lock();
            match accounts.get(email) {
                Some((stored, identity)) if stored == password => identity.clone(),
                _ => msg_bail_anyhow!(Message::SignInFailed("invalid email or password".to_string())),
            }
        };
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(email) {
                msg_bail_anyhow!(Message::SignInFailed(format!("{} is already registered", email)));
            }
            let identity = Identity::new(&format!("user-{}", Uuid::new_v4().simple()), Some(email));
            accounts.insert(email.to_string(), (password.to_string(), identity.clone()));
            identity
        };
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.identity.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}
