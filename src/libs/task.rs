//! Task and project records as stored locally and exchanged with the backend.

use super::quadrant::Quadrant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pseudo-project meaning "no project filter". Never persisted remotely.
pub const ALL_PROJECT_ID: &str = "all";
/// Fallback project that absorbs tasks of deleted projects.
pub const INBOX_PROJECT_ID: &str = "inbox";
pub const DEFAULT_PROJECT_EMOJI: &str = "📁";

/// A single to-do item.
///
/// The quadrant is not stored directly: it is derived from the `important`
/// and `urgent` flags (see [`Task::quadrant`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Client-generated id until the backend confirms the create, then the
    /// backend's id.
    pub id: String,
    /// Trimmed, never empty.
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default = "inbox_id")]
    pub project_id: String,
    /// Creation time, also the manual sort key.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl Task {
    /// Creates an open task with a fresh id and the current time.
    ///
    /// # Arguments
    ///
    /// * `title` - Task title, trimmed here; callers reject blank titles
    /// * `quadrant` - Initial bucket, stored as the two flags
    /// * `project_id` - Owning project, expected to be assignable
    pub fn new(title: &str, quadrant: Quadrant, project_id: &str) -> Self {
        let (important, urgent) = quadrant.flags();
        Task {
            id: new_task_id(),
            title: title.trim().to_string(),
            done: false,
            important,
            urgent,
            project_id: project_id.to_string(),
            created_at: Utc::now(),
            notes: String::new(),
        }
    }

    pub fn quadrant(&self) -> Quadrant {
        Quadrant::classify(self.important, self.urgent)
    }

    pub fn set_quadrant(&mut self, quadrant: Quadrant) {
        let (important, urgent) = quadrant.flags();
        self.important = important;
        self.urgent = urgent;
    }

    /// Repairs fields a remote row may carry that the local model forbids.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        if self.project_id.is_empty() || self.project_id == ALL_PROJECT_ID {
            self.project_id = INBOX_PROJECT_ID.to_string();
        }
        self
    }
}

/// Partial task update sent to the remote on field-level mutations.
///
/// `None` fields are left untouched. The REST row encodes the quadrant as one
/// column, so `important` and `urgent` are only meaningful together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn quadrant(quadrant: Quadrant) -> Self {
        let (important, urgent) = quadrant.flags();
        TaskPatch {
            important: Some(important),
            urgent: Some(urgent),
            ..Default::default()
        }
    }

    /// Fields of `to` that differ from `from`, as a patch.
    ///
    /// Used to replay local edits made while a task was still being created
    /// remotely. A change to either flag carries both.
    ///
    /// # Arguments
    ///
    /// * `from` - The record the backend currently holds
    /// * `to` - The local record
    ///
    /// # Returns
    ///
    /// An empty patch when the two agree on every patchable field.
    pub fn diff(from: &Task, to: &Task) -> Self {
        let flags_changed = from.important != to.important || from.urgent != to.urgent;
        TaskPatch {
            title: (from.title != to.title).then(|| to.title.clone()),
            done: (from.done != to.done).then_some(to.done),
            important: flags_changed.then_some(to.important),
            urgent: flags_changed.then_some(to.urgent),
            project_id: (from.project_id != to.project_id).then(|| to.project_id.clone()),
            created_at: (from.created_at != to.created_at).then_some(to.created_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(important) = self.important {
            task.important = important;
        }
        if let Some(urgent) = self.urgent {
            task.urgent = urgent;
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone();
        }
        if let Some(created_at) = self.created_at {
            task.created_at = created_at;
        }
    }
}

/// A named group of tasks. `all` and `inbox` are reserved and always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
}

impl Project {
    /// Creates a user project with a `prj_` prefixed id.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name, trimmed
    /// * `emoji` - Badge; blank or missing falls back to [`DEFAULT_PROJECT_EMOJI`]
    ///
    /// # Example
    ///
    /// ```rust
    /// use eisen::libs::task::{Project, DEFAULT_PROJECT_EMOJI};
    ///
    /// let project = Project::new(" Garden ", Some(" "));
    /// assert_eq!(project.name, "Garden");
    /// assert_eq!(project.emoji, DEFAULT_PROJECT_EMOJI);
    /// assert!(project.id.starts_with("prj_"));
    /// ```
    pub fn new(name: &str, emoji: Option<&str>) -> Self {
        Project {
            id: format!("prj_{}", Uuid::new_v4().simple()),
            name: name.trim().to_string(),
            emoji: emoji.filter(|e| !e.trim().is_empty()).unwrap_or(DEFAULT_PROJECT_EMOJI).to_string(),
        }
    }

    pub fn all() -> Self {
        Project {
            id: ALL_PROJECT_ID.to_string(),
            name: "All".to_string(),
            emoji: "🗂️".to_string(),
        }
    }

    pub fn inbox() -> Self {
        Project {
            id: INBOX_PROJECT_ID.to_string(),
            name: "Inbox".to_string(),
            emoji: "📥".to_string(),
        }
    }

    /// True for `all` and `inbox`, which can be neither renamed nor deleted.
    pub fn is_reserved(id: &str) -> bool {
        id == ALL_PROJECT_ID || id == INBOX_PROJECT_ID
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

/// 32 hex digits, no dashes.
pub fn new_task_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn inbox_id() -> String {
    INBOX_PROJECT_ID.to_string()
}

fn default_emoji() -> String {
    DEFAULT_PROJECT_EMOJI.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_carries_only_changed_fields() {
        let server = Task::new("Call mom", Quadrant::Neither, INBOX_PROJECT_ID);
        let mut local = server.clone();
        assert!(TaskPatch::diff(&server, &local).is_empty());

        local.done = true;
        local.urgent = true;
        let patch = TaskPatch::diff(&server, &local);
        assert_eq!(patch.done, Some(true));
        assert_eq!((patch.important, patch.urgent), (Some(false), Some(true)));
        assert!(patch.title.is_none() && patch.project_id.is_none() && patch.created_at.is_none());

        let mut replayed = server.clone();
        patch.apply(&mut replayed);
        assert_eq!(replayed, local);
    }
}
