//! Per-session application context.
//!
//! [`App`] owns the store and wires it to persistence and the sync engine.
//! Every mutation returns a [`Commit`]: the local phase is already applied
//! when the method returns, while the saved snapshot and the backend write
//! finish in the background and can be awaited through the commit.
//!
//! ```rust,no_run
//! use eisen::api::{MemoryAuth, MemoryRemote};
//! use eisen::libs::app::{App, AppOptions};
//! use eisen::libs::persistence::MemoryStorage;
//! use eisen::libs::store::AddTaskOptions;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let app = App::start(
//!     AppOptions::default(),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(MemoryRemote::new()),
//!     Arc::new(MemoryAuth::new()),
//! )
//! .await;
//! let commit = app.add_task("Pay rent", AddTaskOptions::default());
//! assert!(commit.applied());
//! commit.settle().await?;
//! # Ok(())
//! # }
//! ```

use super::config::Config;
use super::messages::Message;
use super::persistence::{Persistence, StateStorage};
use super::store::{AddTaskOptions, Change, StoreState, TaskStore, ViewMode};
use super::sync::{AuthState, SyncEngine, SyncError};
use crate::api::{AuthProvider, Identity, RemoteSource};
use crate::msg_debug;
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Session settings, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Initial compact mode when nothing was saved yet.
    pub compact_mode: bool,
    /// Bound for every backend call.
    pub timeout: Duration,
    /// How long the shell offers to undo a delete.
    pub undo_window: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AppOptions {
    fn from(config: &Config) -> Self {
        Self {
            compact_mode: config.ui.compact_mode,
            timeout: config.sync.timeout(),
            undo_window: config.ui.undo_window(),
        }
    }
}

/// Outcome of one mutation.
pub struct Commit {
    pub change: Option<Change>,
    /// State right after the local phase.
    pub snapshot: Arc<StoreState>,
    persisted: Option<JoinHandle<()>>,
    remote: Option<JoinHandle<Result<(), SyncError>>>,
}

impl Commit {
    fn rejected(snapshot: Arc<StoreState>) -> Self {
        Self {
            change: None,
            snapshot,
            persisted: None,
            remote: None,
        }
    }

    /// False when the input was rejected and nothing changed.
    pub fn applied(&self) -> bool {
        self.change.is_some()
    }

    /// Whether a backend write was started.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// True once the background phases have run to completion, without
    /// waiting for them.
    pub fn is_finished(&self) -> bool {
        self.persisted.as_ref().map_or(true, JoinHandle::is_finished) && self.remote.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the snapshot to be saved and the backend write to finish.
    /// Returns the backend result; local state is never rolled back.
    pub async fn settle(self) -> Result<(), SyncError> {
        if let Some(persisted) = self.persisted {
            let _ = persisted.await;
        }
        match self.remote {
            Some(remote) => remote.await.map_err(|e| SyncError::Remote(e.into()))?,
            None => Ok(()),
        }
    }
}

/// Store, persistence and sync wired together for one process.
///
/// Dropping the app stops the identity watcher. Background writes already
/// started keep running.
pub struct App {
    store: Arc<Mutex<TaskStore>>,
    persistence: Persistence,
    sync: SyncEngine,
    auth: Arc<dyn AuthProvider>,
    watcher: JoinHandle<()>,
    options: AppOptions,
}

impl App {
    /// Restores the saved state, catches up with the current identity and
    /// starts following identity changes.
    ///
    /// A saved state that cannot be read is logged and the app starts empty.
    /// When an identity is already published, the initial reload has run
    /// by the time this returns.
    ///
    /// # Arguments
    ///
    /// * `options` - Session settings
    /// * `storage` - Backend for the saved state
    /// * `remote` - Backend data source
    /// * `auth` - Identity provider the engine follows
    pub async fn start(options: AppOptions, storage: Arc<dyn StateStorage>, remote: Arc<dyn RemoteSource>, auth: Arc<dyn AuthProvider>) -> App {
        let persistence = Persistence::new(storage);
        let mut store = TaskStore::new(options.compact_mode);
        match persistence.load().await {
            Ok(Some(loaded)) => {
                msg_debug!(Message::StateLoaded(loaded.state.tasks.len()));
                store.restore(loaded.state, loaded.revision);
            }
            Ok(None) => {}
            Err(e) => warn!("{}", Message::StateLoadFailed(e.to_string())),
        }

        let store = Arc::new(Mutex::new(store));
        let sync = SyncEngine::new(Arc::clone(&store), persistence.clone(), remote, options.timeout);

        let mut identities = auth.subscribe();
        let initial = identities.borrow_and_update().clone();
        sync.on_auth_state_change(initial).await;
        let watcher = sync.watch(identities);

        App {
            store,
            persistence,
            sync,
            auth,
            watcher,
            options,
        }
    }

    pub fn snapshot(&self) -> Arc<StoreState> {
        self.store.lock().snapshot()
    }

    pub fn auth_state(&self) -> AuthState {
        self.sync.auth_state()
    }

    /// Every auth state change, starting from the current one.
    pub fn auth_states(&self) -> watch::Receiver<AuthState> {
        self.sync.subscribe()
    }

    pub fn undo_window(&self) -> Duration {
        self.options.undo_window
    }

    fn apply<F>(&self, mutate: F) -> Commit
    where
        F: FnOnce(&mut TaskStore) -> Option<Change>,
    {
        let (change, snapshot, revision, remote) = {
            let mut store = self.store.lock();
            let change = mutate(&mut store);
            let remote = change.as_ref().and_then(|change| self.sync.push(change));
            (change, store.snapshot(), store.revision(), remote)
        };
        let Some(change) = change else {
            return Commit::rejected(snapshot);
        };
        let persisted = self.persistence.save(Arc::clone(&snapshot), revision);
        Commit {
            change: Some(change),
            snapshot,
            persisted: Some(persisted),
            remote,
        }
    }

    pub fn add_task(&self, title: &str, options: AddTaskOptions) -> Commit {
        self.apply(|store| store.add_task(title, options))
    }

    pub fn edit_title(&self, id: &str, title: &str) -> Commit {
        self.apply(|store| store.edit_title(id, title))
    }

    pub fn toggle_done(&self, id: &str) -> Commit {
        self.apply(|store| store.toggle_done(id))
    }

    pub fn delete_task(&self, id: &str) -> Commit {
        self.apply(|store| store.delete_task(id))
    }

    pub fn undo_delete(&self) -> Commit {
        self.apply(|store| store.undo_delete())
    }

    pub fn move_to_quadrant(&self, id: &str, key: &str) -> Commit {
        self.apply(|store| store.move_to_quadrant(id, key))
    }

    pub fn move_to_project(&self, id: &str, project_id: &str) -> Commit {
        self.apply(|store| store.move_to_project(id, project_id))
    }

    pub fn set_created_at(&self, id: &str, iso: &str) -> Commit {
        self.apply(|store| store.set_created_at(id, iso))
    }

    pub fn move_up(&self, id: &str) -> Commit {
        self.apply(|store| store.move_up(id))
    }

    pub fn move_down(&self, id: &str) -> Commit {
        self.apply(|store| store.move_down(id))
    }

    pub fn add_project(&self, name: &str, emoji: Option<&str>) -> Commit {
        self.apply(|store| store.add_project(name, emoji))
    }

    pub fn rename_project(&self, id: &str, name: &str, emoji: Option<&str>) -> Commit {
        self.apply(|store| store.rename_project(id, name, emoji))
    }

    pub fn delete_project(&self, id: &str) -> Commit {
        self.apply(|store| store.delete_project(id))
    }

    pub fn set_selected_project(&self, id: &str) -> Commit {
        self.apply(|store| store.set_selected_project(id))
    }

    pub fn set_view_mode(&self, mode: ViewMode) -> Commit {
        self.apply(|store| store.set_view_mode(mode))
    }

    pub fn set_filter_important(&self, value: bool) -> Commit {
        self.apply(|store| store.set_filter_important(value))
    }

    pub fn set_filter_urgent(&self, value: bool) -> Commit {
        self.apply(|store| store.set_filter_urgent(value))
    }

    pub fn set_compact_mode(&self, value: bool) -> Commit {
        self.apply(|store| store.set_compact_mode(value))
    }

    /// Full reload from the backend on demand.
    pub async fn reload(&self) -> Result<(usize, usize), SyncError> {
        if !self.auth_state().is_authenticated() {
            return Err(SyncError::NotAuthenticated);
        }
        self.sync.reload().await
    }

    /// Signs in and waits until the reload for the new identity is done.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the credentials are refused.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.auth.sign_in(email, password).await?;
        self.wait_for_auth(|state| matches!(state, AuthState::Authenticated(current) if current.id == identity.id))
            .await;
        Ok(identity)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.auth.sign_up(email, password).await?;
        self.wait_for_auth(|state| matches!(state, AuthState::Authenticated(current) if current.id == identity.id))
            .await;
        Ok(identity)
    }

    /// Drops the identity. The local cache stays.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.auth.sign_out().await;
        self.wait_for_auth(|state| *state == AuthState::Unauthenticated).await;
        result
    }

    /// Waits until the engine has caught up with an identity change. Bounded
    /// by twice the remote timeout since a reload may run in between.
    async fn wait_for_auth<P>(&self, reached: P)
    where
        P: FnMut(&AuthState) -> bool,
    {
        let mut states = self.sync.subscribe();
        let reached = tokio::time::timeout(self.options.timeout * 2, async { states.wait_for(reached).await.is_ok() }).await;
        if !matches!(reached, Ok(true)) {
            warn!("auth state did not settle: {}", self.auth_state());
        }
    }

    /// Forgets the saved state.
    pub async fn clear_local(&self) -> Result<()> {
        self.persistence.clear().await
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
