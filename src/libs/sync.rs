//! Keeping the store in step with the backend.
//!
//! The engine follows the identity published by the auth provider:
//!
//! ```text
//! Unauthenticated ──identity──▶ Authenticating ──reload──▶ Authenticated
//!        ▲                                                      │
//!        └───────────────────────── None ───────────────────────┘
//! ```
//!
//! Entering `Authenticating` triggers a full reload: projects and tasks are
//! fetched in parallel and replace the local collections wholesale. A failed
//! reload is logged and the engine still moves on to `Authenticated` with the
//! local cache intact. Signing out only clears the identity; the cache stays.
//!
//! While authenticated every accepted mutation is pushed in a spawned task.
//! Failures are logged and returned through the task's handle, never rolled
//! back. A created task takes the backend's id once confirmed, so the backend
//! may assign its own. Until then, updates and deletes of that task are held
//! back: the confirmation replays local edits as one update under the new id,
//! or deletes the backend's copy if the task is gone locally.

use super::messages::Message;
use super::persistence::Persistence;
use super::store::{Change, StoreState, TaskStore};
use super::task::{Project, ProjectPatch, Task, TaskPatch, INBOX_PROJECT_ID};
use crate::api::{Identity, RemoteSource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Failure of a backend call. Never rolls back local state.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote call failed: {0}")]
    Remote(#[from] anyhow::Error),
    #[error("remote call timed out after {0} ms")]
    Timeout(u64),
    #[error("not signed in")]
    NotAuthenticated,
}

/// Where the engine stands with respect to the current identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating(Identity),
    Authenticated(Identity),
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Unauthenticated => None,
            AuthState::Authenticating(identity) | AuthState::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticating(identity) => write!(f, "authenticating as {}", identity.display()),
            AuthState::Authenticated(identity) => write!(f, "authenticated as {}", identity.display()),
        }
    }
}

/// One backend call derived from a store change.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    CreateTask(Task),
    UpdateTask { id: String, patch: TaskPatch },
    DeleteTask(String),
    CreateProject(Project),
    UpdateProject { id: String, patch: ProjectPatch },
    DeleteProject(String),
}

impl RemoteOp {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteOp::CreateTask(_) => "create_task",
            RemoteOp::UpdateTask { .. } => "update_task",
            RemoteOp::DeleteTask(_) => "delete_task",
            RemoteOp::CreateProject(_) => "create_project",
            RemoteOp::UpdateProject { .. } => "update_project",
            RemoteOp::DeleteProject(_) => "delete_project",
        }
    }
}

/// Backend calls for a change. Preferences, undo and reserved projects stay
/// local.
pub fn remote_ops(change: &Change) -> Vec<RemoteOp> {
    match change {
        Change::TaskCreated(task) => vec![RemoteOp::CreateTask(task.clone())],
        Change::TaskUpdated { id, patch } => vec![RemoteOp::UpdateTask {
            id: id.clone(),
            patch: patch.clone(),
        }],
        Change::TaskDeleted(task) => vec![RemoteOp::DeleteTask(task.id.clone())],
        Change::TasksReordered(moves) => moves
            .iter()
            .map(|(id, created_at)| RemoteOp::UpdateTask {
                id: id.clone(),
                patch: TaskPatch {
                    created_at: Some(*created_at),
                    ..Default::default()
                },
            })
            .collect(),
        Change::ProjectCreated(project) if !Project::is_reserved(&project.id) => vec![RemoteOp::CreateProject(project.clone())],
        Change::ProjectUpdated { id, patch } if !Project::is_reserved(id) => vec![RemoteOp::UpdateProject {
            id: id.clone(),
            patch: patch.clone(),
        }],
        Change::ProjectDeleted { project, reassigned } => {
            let mut ops: Vec<RemoteOp> = reassigned
                .iter()
                .map(|id| RemoteOp::UpdateTask {
                    id: id.clone(),
                    patch: TaskPatch {
                        project_id: Some(INBOX_PROJECT_ID.to_string()),
                        ..Default::default()
                    },
                })
                .collect();
            ops.push(RemoteOp::DeleteProject(project.id.clone()));
            ops
        }
        _ => Vec::new(),
    }
}

/// Follows the auth provider and mirrors store changes to the backend.
/// Clones share all state.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<Mutex<TaskStore>>,
    persistence: Persistence,
    remote: Arc<dyn RemoteSource>,
    state: Arc<watch::Sender<AuthState>>,
    /// Local ids whose create has not been confirmed yet, mapped to whether
    /// the task was deleted locally since.
    creating: Arc<Mutex<HashMap<String, bool>>>,
    timeout: Duration,
}

impl SyncEngine {
    /// Builds an engine in the `Unauthenticated` state.
    ///
    /// # Arguments
    ///
    /// * `store` - Shared store; the engine writes reloads and confirmations
    ///   into it
    /// * `persistence` - Where the engine saves after changing the store
    /// * `remote` - Backend data source
    /// * `timeout` - Upper bound for every backend call
    pub fn new(store: Arc<Mutex<TaskStore>>, persistence: Persistence, remote: Arc<dyn RemoteSource>, timeout: Duration) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            store,
            persistence,
            remote,
            state: Arc::new(state),
            creating: Arc::new(Mutex::new(HashMap::new())),
            timeout,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn persist(&self) -> JoinHandle<()> {
        let (snapshot, revision) = {
            let store = self.store.lock();
            (store.snapshot(), store.revision())
        };
        self.persistence.save(snapshot, revision)
    }

    /// Reacts to an identity published by the auth provider.
    pub async fn on_auth_state_change(&self, identity: Option<Identity>) {
        let current = self.auth_state();
        match identity {
            None => {
                if current == AuthState::Unauthenticated {
                    return;
                }
                let cleared = self.store.lock().set_identity(None);
                if cleared.is_some() {
                    let _ = self.persist().await;
                }
                self.state.send_replace(AuthState::Unauthenticated);
                info!("{}", Message::AuthStateChanged(AuthState::Unauthenticated.to_string()));
            }
            Some(identity) => {
                if current.identity() == Some(&identity) {
                    return;
                }
                self.state.send_replace(AuthState::Authenticating(identity.clone()));
                self.store.lock().set_identity(Some(identity.clone()));
                info!("{}", Message::ReloadStarted(identity.display().to_string()));

                match self.reload().await {
                    Ok((projects, tasks)) => info!("{}", Message::ReloadCompleted(projects, tasks)),
                    Err(e) => {
                        warn!("{}", Message::ReloadFailed(e.to_string()));
                        let _ = self.persist().await;
                    }
                }

                let next = AuthState::Authenticated(identity);
                info!("{}", Message::AuthStateChanged(next.to_string()));
                self.state.send_replace(next);
            }
        }
    }

    /// Fetches everything and replaces the local collections. Returns the
    /// number of projects and tasks received.
    pub async fn reload(&self) -> Result<(usize, usize), SyncError> {
        let (projects, tasks) = tokio::try_join!(self.call(self.remote.fetch_projects()), self.call(self.remote.fetch_tasks()))?;
        let counts = (projects.len(), tasks.len());
        self.store.lock().replace_remote(projects, tasks);
        let _ = self.persist().await;
        Ok(counts)
    }

    /// Follows identity changes until the provider goes away.
    pub fn watch(&self, mut identities: watch::Receiver<Option<Identity>>) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            while identities.changed().await.is_ok() {
                let identity = identities.borrow_and_update().clone();
                engine.on_auth_state_change(identity).await;
            }
            debug!("{}", Message::AuthWatcherStopped);
        })
    }

    /// Sends a change to the backend in the background.
    ///
    /// Must be called while the store lock that produced `change` is still
    /// held, so that a task's create is registered before any later edit of
    /// it is pushed. Updates and deletes of a task whose create is still in
    /// flight are not sent; the confirmation takes care of them.
    ///
    /// # Returns
    ///
    /// `None` when there is nothing to send or nobody is signed in.
    /// Otherwise a handle resolving to the last error among the calls made.
    pub fn push(&self, change: &Change) -> Option<JoinHandle<Result<(), SyncError>>> {
        if !self.auth_state().is_authenticated() {
            return None;
        }
        let mut ops = remote_ops(change);
        {
            let mut creating = self.creating.lock();
            ops.retain(|op| match op {
                RemoteOp::CreateTask(task) => {
                    creating.insert(task.id.clone(), false);
                    true
                }
                RemoteOp::UpdateTask { id, .. } if creating.contains_key(id) => {
                    debug!("{}", Message::RemoteWriteDeferred(op.name().to_string(), id.clone()));
                    false
                }
                RemoteOp::DeleteTask(id) => match creating.get_mut(id) {
                    Some(deleted) => {
                        *deleted = true;
                        debug!("{}", Message::RemoteWriteDeferred(op.name().to_string(), id.clone()));
                        false
                    }
                    None => true,
                },
                _ => true,
            });
        }
        if ops.is_empty() {
            return None;
        }
        let engine = self.clone();
        Some(tokio::spawn(async move {
            let mut result = Ok(());
            for op in ops {
                let name = op.name();
                if let Err(e) = engine.apply(op).await {
                    warn!("{}", Message::RemoteWriteFailed(name.to_string(), e.to_string()));
                    result = Err(e);
                }
            }
            result
        }))
    }

    async fn apply(&self, op: RemoteOp) -> Result<(), SyncError> {
        match op {
            RemoteOp::CreateTask(task) => match self.call(self.remote.create_task(&task)).await {
                Ok(server) => self.confirm(&task.id, server).await?,
                Err(e) => {
                    self.creating.lock().remove(&task.id);
                    return Err(e);
                }
            },
            RemoteOp::UpdateTask { id, patch } => {
                self.call(self.remote.update_task(&id, &patch)).await?;
            }
            RemoteOp::DeleteTask(id) => self.call(self.remote.delete_task(&id)).await?,
            RemoteOp::CreateProject(project) => {
                self.call(self.remote.create_project(&project)).await?;
            }
            RemoteOp::UpdateProject { id, patch } => {
                self.call(self.remote.update_project(&id, &patch)).await?;
            }
            RemoteOp::DeleteProject(id) => self.call(self.remote.delete_project(&id)).await?,
        }
        Ok(())
    }

    /// Settles a confirmed create against the local store: adopts the
    /// backend's id and sends whatever changed locally in the meantime, or
    /// deletes the backend's copy when the task was deleted locally.
    async fn confirm(&self, local_id: &str, server: Task) -> Result<(), SyncError> {
        let server = server.normalized();
        let outcome = {
            let mut store = self.store.lock();
            let deleted = self.creating.lock().remove(local_id).unwrap_or(false);
            match store.snapshot().task(local_id).cloned() {
                Some(local) => store
                    .confirm_task(local_id, &server.id)
                    .map(|_| Confirmation::Adopted(TaskPatch::diff(&server, &local), store.snapshot(), store.revision())),
                None if deleted && store.snapshot().task(&server.id).is_none() => Some(Confirmation::Deleted),
                None => None,
            }
        };

        match outcome {
            Some(Confirmation::Adopted(patch, snapshot, revision)) => {
                if server.id != local_id {
                    debug!("{}", Message::IdReconciled(local_id.to_string(), server.id.clone()));
                }
                let _ = self.persistence.save(snapshot, revision).await;
                if !patch.is_empty() {
                    self.call(self.remote.update_task(&server.id, &patch)).await?;
                }
            }
            Some(Confirmation::Deleted) => {
                debug!("{}", Message::CreateRevoked(local_id.to_string(), server.id.clone()));
                self.call(self.remote.delete_task(&server.id)).await?;
            }
            None => debug!("{}", Message::ConfirmationDropped(local_id.to_string())),
        }
        Ok(())
    }

    async fn call<T, F>(&self, request: F) -> Result<T, SyncError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(SyncError::Remote(e)),
            Err(_) => Err(SyncError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

enum Confirmation {
    Adopted(TaskPatch, Arc<StoreState>, u64),
    Deleted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::quadrant::Quadrant;

    #[test]
    fn preferences_and_undo_stay_local() {
        let task = Task::new("x", Quadrant::Neither, INBOX_PROJECT_ID);
        assert!(remote_ops(&Change::Preferences).is_empty());
        assert!(remote_ops(&Change::TaskRestored(task)).is_empty());
        assert!(remote_ops(&Change::ProjectCreated(Project::inbox())).is_empty());
    }

    #[test]
    fn project_delete_reassigns_before_deleting() {
        let project = Project::new("Home", None);
        let ops = remote_ops(&Change::ProjectDeleted {
            project: project.clone(),
            reassigned: vec!["t1".to_string()],
        });
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].name(), "update_task");
        assert_eq!(ops[1], RemoteOp::DeleteProject(project.id));
    }
}
