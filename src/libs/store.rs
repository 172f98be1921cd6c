//! In-memory task and project state.
//!
//! [`TaskStore`] owns the current [`StoreState`] behind an `Arc` and swaps in a
//! fresh copy on every accepted mutation, so a snapshot handed out earlier never
//! changes under the reader. Mutations are synchronous and return
//! `Option<Change>`:
//!
//! - `None`: the input was rejected (empty title, unknown bucket key, reserved
//!   project id, missing task) and nothing changed, not even the revision
//! - `Some(change)`: the state was replaced; `change` tells the sync layer what
//!   to send to the backend
//!
//! ## Usage
//!
//! ```rust
//! use eisen::libs::quadrant::Quadrant;
//! use eisen::libs::store::{AddTaskOptions, TaskStore};
//!
//! let mut store = TaskStore::new(false);
//! store.add_task("Pay rent", AddTaskOptions::quadrant(Quadrant::ImportantUrgent));
//! assert!(store.add_task("   ", AddTaskOptions::default()).is_none());
//! assert_eq!(store.snapshot().visible_tasks().len(), 1);
//! ```

use super::ordering::{self, Direction};
use super::persistence::PersistedState;
use super::quadrant::Quadrant;
use super::task::{Project, ProjectPatch, Task, TaskPatch, ALL_PROJECT_ID, INBOX_PROJECT_ID};
use super::undo::UndoBuffer;
use crate::api::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Matrix,
}

impl ViewMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "list" | "l" => Some(ViewMode::List),
            "matrix" | "m" => Some(ViewMode::Matrix),
            _ => None,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::List => write!(f, "list"),
            ViewMode::Matrix => write!(f, "matrix"),
        }
    }
}

/// Visible tasks partitioned by quadrant, each group in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadrantGroups {
    groups: [Vec<Task>; 4],
}

impl QuadrantGroups {
    fn index(quadrant: Quadrant) -> usize {
        match quadrant {
            Quadrant::ImportantUrgent => 0,
            Quadrant::Important => 1,
            Quadrant::Urgent => 2,
            Quadrant::Neither => 3,
        }
    }

    pub fn get(&self, quadrant: Quadrant) -> &[Task] {
        &self.groups[Self::index(quadrant)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quadrant, &[Task])> {
        Quadrant::ALL.into_iter().map(move |q| (q, self.get(q)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub done: usize,
    pub total: usize,
    /// Rounded completion percentage, 0 when there are no tasks.
    pub percent: u8,
}

/// Optional placement for [`TaskStore::add_task`].
#[derive(Debug, Clone, Default)]
pub struct AddTaskOptions {
    pub quadrant: Option<Quadrant>,
    pub project_id: Option<String>,
}

impl AddTaskOptions {
    pub fn quadrant(quadrant: Quadrant) -> Self {
        Self {
            quadrant: Some(quadrant),
            project_id: None,
        }
    }

    pub fn in_project(mut self, project_id: &str) -> Self {
        self.project_id = Some(project_id.to_string());
        self
    }
}

/// What an accepted mutation did.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    TaskCreated(Task),
    TaskUpdated { id: String, patch: TaskPatch },
    TaskDeleted(Task),
    /// Undo of a delete. Local only.
    TaskRestored(Task),
    /// New `created_at` values after a manual move.
    TasksReordered(Vec<(String, DateTime<Utc>)>),
    ProjectCreated(Project),
    ProjectUpdated { id: String, patch: ProjectPatch },
    ProjectDeleted { project: Project, reassigned: Vec<String> },
    Preferences,
    Identity(Option<Identity>),
    Reloaded,
    TaskConfirmed { local_id: String, server_id: String },
    Restored,
}

/// Immutable view handed to readers. Selectors live here so a snapshot can be
/// rendered without holding the store lock.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    /// `all` first, then `inbox`, then user projects in creation order.
    pub projects: Vec<Project>,
    /// Newest first. Display order comes from [`StoreState::visible_tasks`].
    pub tasks: Vec<Task>,
    pub selected_project_id: String,
    pub view_mode: ViewMode,
    pub filter_important: bool,
    pub filter_urgent: bool,
    pub compact_mode: bool,
    pub last_deleted: UndoBuffer,
    pub identity: Option<Identity>,
}

impl StoreState {
    pub fn new(compact_mode: bool) -> Self {
        Self {
            projects: vec![Project::all(), Project::inbox()],
            tasks: Vec::new(),
            selected_project_id: ALL_PROJECT_ID.to_string(),
            view_mode: ViewMode::List,
            filter_important: false,
            filter_urgent: false,
            compact_mode,
            last_deleted: UndoBuffer::new(),
            identity: None,
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.project(&self.selected_project_id)
    }

    /// Tasks of the selected project that pass the flag filters, sorted.
    pub fn visible_tasks(&self) -> Vec<Task> {
        let all = self.selected_project_id == ALL_PROJECT_ID;
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| all || t.project_id == self.selected_project_id)
            .filter(|t| !self.filter_important || t.important)
            .filter(|t| !self.filter_urgent || t.urgent)
            .cloned()
            .collect();
        ordering::sort_tasks(&mut tasks);
        tasks
    }

    /// Visible tasks split by quadrant, each group keeping the list order.
    pub fn grouped(&self) -> QuadrantGroups {
        let mut groups = QuadrantGroups::default();
        for task in self.visible_tasks() {
            groups.groups[QuadrantGroups::index(task.quadrant())].push(task);
        }
        groups
    }

    /// Done and total counts over the visible tasks. `percent` is rounded and
    /// zero for an empty list.
    pub fn stats(&self) -> Stats {
        let visible = self.visible_tasks();
        let total = visible.len();
        let done = visible.iter().filter(|t| t.done).count();
        let percent = if total == 0 {
            0
        } else {
            ((done as f64 / total as f64) * 100.0).round() as u8
        };
        Stats { done, total, percent }
    }

    /// Project label shown next to a task while every project is listed.
    pub fn project_badge(&self, task: &Task) -> Option<&Project> {
        if self.selected_project_id != ALL_PROJECT_ID {
            return None;
        }
        self.project(&task.project_id).or_else(|| self.project(INBOX_PROJECT_ID))
    }

    /// The ordered list a manual move operates in: the whole visible list, or
    /// the task's own quadrant in matrix view.
    pub fn move_scope(&self, task: &Task) -> Vec<Task> {
        match self.view_mode {
            ViewMode::List => self.visible_tasks(),
            ViewMode::Matrix => self.grouped().get(task.quadrant()).to_vec(),
        }
    }

    fn is_assignable(&self, project_id: &str) -> bool {
        project_id != ALL_PROJECT_ID && self.project(project_id).is_some()
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn ensure_reserved_projects(&mut self) {
        self.projects.retain(|p| p.id != ALL_PROJECT_ID);
        self.projects.insert(0, Project::all());
        if self.project(INBOX_PROJECT_ID).is_none() {
            self.projects.insert(1, Project::inbox());
        }
    }

    fn repair_references(&mut self) {
        let known: Vec<String> = self.projects.iter().map(|p| p.id.clone()).collect();
        for task in self.tasks.iter_mut() {
            if !known.contains(&task.project_id) || task.project_id == ALL_PROJECT_ID {
                task.project_id = INBOX_PROJECT_ID.to_string();
            }
        }
        if !known.contains(&self.selected_project_id) {
            self.selected_project_id = ALL_PROJECT_ID.to_string();
        }
    }
}

/// Owner of the current [`StoreState`]. Not thread-safe on its own; the app
/// keeps it behind a mutex.
pub struct TaskStore {
    state: Arc<StoreState>,
    revision: u64,
}

impl TaskStore {
    pub fn new(compact_mode: bool) -> Self {
        Self {
            state: Arc::new(StoreState::new(compact_mode)),
            revision: 0,
        }
    }

    pub fn snapshot(&self) -> Arc<StoreState> {
        Arc::clone(&self.state)
    }

    /// Bumped once per accepted mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn commit<F>(&mut self, mutate: F) -> Option<Change>
    where
        F: FnOnce(&mut StoreState) -> Option<Change>,
    {
        let mut next = StoreState::clone(&self.state);
        let change = mutate(&mut next)?;
        self.state = Arc::new(next);
        self.revision += 1;
        debug!(revision = self.revision, change = ?change, "store updated");
        Some(change)
    }

    /// Creates a task at the head of the collection.
    ///
    /// # Arguments
    ///
    /// * `title` - Trimmed; blank titles are rejected
    /// * `options` - Bucket (default "neither") and project. A missing or
    ///   unassignable project falls back to the selected project, then to
    ///   the inbox.
    ///
    /// # Returns
    ///
    /// `Some(Change::TaskCreated)` carrying the new task, `None` on a blank
    /// title.
    pub fn add_task(&mut self, title: &str, options: AddTaskOptions) -> Option<Change> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        self.commit(|state| {
            let project_id = match options.project_id {
                Some(id) if state.is_assignable(&id) => id,
                _ if state.is_assignable(&state.selected_project_id) => state.selected_project_id.clone(),
                _ => INBOX_PROJECT_ID.to_string(),
            };
            let task = Task::new(title, options.quadrant.unwrap_or(Quadrant::Neither), &project_id);
            state.tasks.insert(0, task.clone());
            Some(Change::TaskCreated(task))
        })
    }

    /// Rejects blank titles and unknown ids.
    pub fn edit_title(&mut self, id: &str, title: &str) -> Option<Change> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        self.commit(|state| {
            let task = state.task_mut(id)?;
            task.title = title.to_string();
            Some(Change::TaskUpdated {
                id: id.to_string(),
                patch: TaskPatch {
                    title: Some(title.to_string()),
                    ..Default::default()
                },
            })
        })
    }

    pub fn toggle_done(&mut self, id: &str) -> Option<Change> {
        self.commit(|state| {
            let task = state.task_mut(id)?;
            task.done = !task.done;
            Some(Change::TaskUpdated {
                id: id.to_string(),
                patch: TaskPatch {
                    done: Some(task.done),
                    ..Default::default()
                },
            })
        })
    }

    /// Removes a task and keeps it in the undo slot, replacing whatever the
    /// slot held.
    ///
    /// # Returns
    ///
    /// `Some(Change::TaskDeleted)` with the removed task, `None` for an
    /// unknown id.
    pub fn delete_task(&mut self, id: &str) -> Option<Change> {
        self.commit(|state| {
            let idx = state.tasks.iter().position(|t| t.id == id)?;
            let task = state.tasks.remove(idx);
            state.last_deleted.stash(task.clone());
            Some(Change::TaskDeleted(task))
        })
    }

    /// Puts the last deleted task back at the head of the collection.
    ///
    /// The task keeps its id and fields. If its project is gone it lands in
    /// the inbox. Does nothing when the slot is empty or a task with the same
    /// id exists again.
    pub fn undo_delete(&mut self) -> Option<Change> {
        let pending = self.state.last_deleted.peek()?;
        if self.state.task(&pending.id).is_some() {
            return None;
        }
        self.commit(|state| {
            let mut task = state.last_deleted.take()?;
            if !state.is_assignable(&task.project_id) {
                task.project_id = INBOX_PROJECT_ID.to_string();
            }
            state.tasks.insert(0, task.clone());
            Some(Change::TaskRestored(task))
        })
    }

    /// # Arguments
    ///
    /// * `id` - Task to move
    /// * `key` - Bucket key as accepted by [`Quadrant::parse`] (`uv`, `v`,
    ///   `u`, `o` or a long name)
    pub fn move_to_quadrant(&mut self, id: &str, key: &str) -> Option<Change> {
        let quadrant = Quadrant::parse(key)?;
        self.commit(|state| {
            state.task_mut(id)?.set_quadrant(quadrant);
            Some(Change::TaskUpdated {
                id: id.to_string(),
                patch: TaskPatch::quadrant(quadrant),
            })
        })
    }

    /// Reassigns a task. Rejected for `all`, unknown projects and when the
    /// task is already there.
    pub fn move_to_project(&mut self, id: &str, project_id: &str) -> Option<Change> {
        self.commit(|state| {
            if !state.is_assignable(project_id) {
                return None;
            }
            let task = state.task_mut(id)?;
            if task.project_id == project_id {
                return None;
            }
            task.project_id = project_id.to_string();
            Some(Change::TaskUpdated {
                id: id.to_string(),
                patch: TaskPatch {
                    project_id: Some(project_id.to_string()),
                    ..Default::default()
                },
            })
        })
    }

    /// Overwrites the manual sort key. Unparseable timestamps are ignored.
    pub fn set_created_at(&mut self, id: &str, iso: &str) -> Option<Change> {
        let created_at = DateTime::parse_from_rfc3339(iso.trim()).ok()?.with_timezone(&Utc);
        self.commit(|state| {
            state.task_mut(id)?.created_at = created_at;
            Some(Change::TaskUpdated {
                id: id.to_string(),
                patch: TaskPatch {
                    created_at: Some(created_at),
                    ..Default::default()
                },
            })
        })
    }

    /// Swaps `created_at` with the previous task in the move scope (see
    /// [`StoreState::move_scope`]). `None` at the top of the scope.
    pub fn move_up(&mut self, id: &str) -> Option<Change> {
        self.shift(id, Direction::Up)
    }

    pub fn move_down(&mut self, id: &str) -> Option<Change> {
        self.shift(id, Direction::Down)
    }

    fn shift(&mut self, id: &str, direction: Direction) -> Option<Change> {
        self.commit(|state| {
            let task = state.task(id)?.clone();
            let scope = state.move_scope(&task);
            let (me, other) = ordering::neighbour(&scope, id, direction)?;
            let (me_id, me_at) = (me.id.clone(), me.created_at);
            let (other_id, other_at) = (other.id.clone(), other.created_at);

            state.task_mut(&me_id)?.created_at = other_at;
            state.task_mut(&other_id)?.created_at = me_at;
            Some(Change::TasksReordered(vec![(me_id, other_at), (other_id, me_at)]))
        })
    }

    /// Appends a user project. Blank names are rejected.
    pub fn add_project(&mut self, name: &str, emoji: Option<&str>) -> Option<Change> {
        if name.trim().is_empty() {
            return None;
        }
        self.commit(|state| {
            let project = Project::new(name, emoji);
            state.projects.push(project.clone());
            Some(Change::ProjectCreated(project))
        })
    }

    /// Renames a project and optionally swaps its badge. The inbox can be
    /// renamed, `all` cannot.
    ///
    /// # Arguments
    ///
    /// * `id` - Project to rename
    /// * `name` - New name, trimmed, must not be blank
    /// * `emoji` - New badge; blank or `None` keeps the current one
    pub fn rename_project(&mut self, id: &str, name: &str, emoji: Option<&str>) -> Option<Change> {
        let name = name.trim();
        if name.is_empty() || id == ALL_PROJECT_ID {
            return None;
        }
        let emoji = emoji.map(str::trim).filter(|e| !e.is_empty());
        self.commit(|state| {
            let project = state.projects.iter_mut().find(|p| p.id == id)?;
            project.name = name.to_string();
            if let Some(emoji) = emoji {
                project.emoji = emoji.to_string();
            }
            Some(Change::ProjectUpdated {
                id: id.to_string(),
                patch: ProjectPatch {
                    name: Some(name.to_string()),
                    emoji: emoji.map(str::to_string),
                },
            })
        })
    }

    /// Removes a user project, moving its tasks to the inbox.
    ///
    /// A deleted selected project resets the selection to `all`.
    ///
    /// # Returns
    ///
    /// `Some(Change::ProjectDeleted)` listing the reassigned task ids in
    /// collection order, `None` for reserved or unknown projects.
    pub fn delete_project(&mut self, id: &str) -> Option<Change> {
        if Project::is_reserved(id) {
            return None;
        }
        self.commit(|state| {
            let idx = state.projects.iter().position(|p| p.id == id)?;
            let project = state.projects.remove(idx);
            let mut reassigned = Vec::new();
            for task in state.tasks.iter_mut().filter(|t| t.project_id == id) {
                task.project_id = INBOX_PROJECT_ID.to_string();
                reassigned.push(task.id.clone());
            }
            if state.selected_project_id == id {
                state.selected_project_id = ALL_PROJECT_ID.to_string();
            }
            Some(Change::ProjectDeleted { project, reassigned })
        })
    }

    /// Unknown ids select every project.
    pub fn set_selected_project(&mut self, id: &str) -> Option<Change> {
        self.commit(|state| {
            state.selected_project_id = match state.project(id) {
                Some(project) => project.id.clone(),
                None => ALL_PROJECT_ID.to_string(),
            };
            Some(Change::Preferences)
        })
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> Option<Change> {
        self.commit(|state| {
            state.view_mode = mode;
            Some(Change::Preferences)
        })
    }

    pub fn set_filter_important(&mut self, value: bool) -> Option<Change> {
        self.commit(|state| {
            state.filter_important = value;
            Some(Change::Preferences)
        })
    }

    pub fn set_filter_urgent(&mut self, value: bool) -> Option<Change> {
        self.commit(|state| {
            state.filter_urgent = value;
            Some(Change::Preferences)
        })
    }

    pub fn set_compact_mode(&mut self, value: bool) -> Option<Change> {
        self.commit(|state| {
            state.compact_mode = value;
            Some(Change::Preferences)
        })
    }

    pub fn set_identity(&mut self, identity: Option<Identity>) -> Option<Change> {
        self.commit(|state| {
            state.identity = identity.clone();
            Some(Change::Identity(identity))
        })
    }

    /// Wholesale replace with the backend's collections. Local-only tasks
    /// are dropped. The undo slot survives.
    ///
    /// Rows are normalized, reserved projects are re-added and dangling
    /// project references fall back to the inbox.
    pub fn replace_remote(&mut self, projects: Vec<Project>, tasks: Vec<Task>) -> Option<Change> {
        self.commit(|state| {
            state.projects = projects;
            state.ensure_reserved_projects();
            state.tasks = tasks.into_iter().map(Task::normalized).collect();
            state.repair_references();
            Some(Change::Reloaded)
        })
    }

    /// Renames a freshly created task to the id the backend assigned.
    ///
    /// Only the id is taken from the backend. Every other field keeps its
    /// local value, so edits made while the create was in flight survive.
    ///
    /// # Arguments
    ///
    /// * `local_id` - Id the task was created with
    /// * `server_id` - Id returned by the backend
    ///
    /// # Returns
    ///
    /// `None` when the task was deleted locally in the meantime, or when
    /// another task already holds `server_id`.
    pub fn confirm_task(&mut self, local_id: &str, server_id: &str) -> Option<Change> {
        self.commit(|state| {
            if server_id != local_id && state.task(server_id).is_some() {
                return None;
            }
            state.task_mut(local_id)?.id = server_id.to_string();
            Some(Change::TaskConfirmed {
                local_id: local_id.to_string(),
                server_id: server_id.to_string(),
            })
        })
    }

    /// Loads a persisted slice. Identity and the undo slot start empty.
    pub fn restore(&mut self, persisted: PersistedState, revision: u64) -> Option<Change> {
        let change = self.commit(|state| {
            let compact_mode = state.compact_mode;
            *state = StoreState::new(compact_mode);
            persisted.apply(state);
            state.ensure_reserved_projects();
            state.repair_references();
            Some(Change::Restored)
        });
        self.revision = self.revision.max(revision);
        change
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(false)
    }
}
