//! JSON-over-HTTP backend client.
//!
//! Talks to a REST backend that stores one row per task and per project. The
//! row shape differs from the local model in two places, both handled here:
//!
//! - the quadrant is a single `quadrant` column (`Q1`..`Q4`), decoded with
//!   [`Quadrant::from_remote_code`] so missing or unknown values mean "neither"
//! - the inbox is implicit: a task in the inbox has a `null` project id
//!
//! The session (access token plus identity) is cached in the data directory,
//! so a later run starts signed in and the sync engine reloads immediately.
//!
//! ## Endpoints
//!
//! | call            | request                    |
//! |-----------------|----------------------------|
//! | sign in / up    | `POST auth/sign-in`, `POST auth/sign-up` |
//! | sign out        | `POST auth/sign-out`       |
//! | tasks           | `GET/POST tasks`, `PATCH/DELETE tasks/{id}` |
//! | projects        | `GET/POST projects`, `PATCH/DELETE projects/{id}` |

use super::{AuthProvider, Identity, RemoteSource};
use crate::libs::config::ConfigModule;
use crate::libs::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::libs::quadrant::Quadrant;
use crate::libs::task::{Project, ProjectPatch, Task, TaskPatch, INBOX_PROJECT_ID};
use crate::{msg_bail_anyhow, msg_print, msg_warning};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dialoguer::{theme::ColorfulTheme, Input};
use parking_lot::RwLock;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

const SESSION_FILE: &str = ".session";
const SIGN_IN_URL: &str = "auth/sign-in";
const SIGN_UP_URL: &str = "auth/sign-up";
const SIGN_OUT_URL: &str = "auth/sign-out";
const TASKS_URL: &str = "tasks";
const PROJECTS_URL: &str = "projects";
const API_KEY_HEADER: &str = "apikey";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RemoteConfig {
    /// Base URL of the backend, without a trailing slash.
    pub api_url: String,
    /// Public project key sent with every request.
    pub api_key: String,
}

impl RemoteConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "remote".to_string(),
            name: "Remote backend".to_string(),
        }
    }

    /// Prompts for the backend settings, offering the current values as
    /// defaults.
    pub fn init(config: &Option<RemoteConfig>) -> Result<Self> {
        let config = config.clone().unwrap_or(RemoteConfig {
            api_url: "".to_string(),
            api_key: "".to_string(),
        });
        msg_print!(Message::ConfigModuleRemote);
        Ok(RemoteConfig {
            api_url: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptApiUrl.to_string())
                .default(config.api_url)
                .interact_text()?,
            api_key: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptApiKey.to_string())
                .default(config.api_key)
                .interact_text()?,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct SavedSession {
    access_token: String,
    user: Identity,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TaskRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    title: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    quadrant: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    notes: Option<String>,
}

impl TaskRow {
    fn from_task(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            title: task.title.clone(),
            done: task.done,
            quadrant: Some(task.quadrant().remote_code().to_string()),
            project_id: remote_project_id(&task.project_id),
            created_at: Some(task.created_at),
            updated_at: None,
            notes: Some(task.notes.clone()),
        }
    }

    fn into_task(self) -> Result<Task> {
        let Some(id) = self.id else {
            anyhow::bail!("task row without id");
        };
        let mut task = Task {
            id,
            title: self.title,
            done: self.done,
            important: false,
            urgent: false,
            project_id: self.project_id.unwrap_or_else(|| INBOX_PROJECT_ID.to_string()),
            created_at: self.created_at.or(self.updated_at).unwrap_or_else(Utc::now),
            notes: self.notes.unwrap_or_default(),
        };
        task.set_quadrant(Quadrant::from_remote_code(self.quadrant.as_deref()));
        Ok(task.normalized())
    }
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct TaskRowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quadrant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl From<&TaskPatch> for TaskRowPatch {
    fn from(patch: &TaskPatch) -> Self {
        let quadrant = match (patch.important, patch.urgent) {
            (Some(important), Some(urgent)) => Some(Quadrant::classify(important, urgent).remote_code().to_string()),
            _ => None,
        };
        Self {
            title: patch.title.clone(),
            done: patch.done,
            quadrant,
            project_id: patch.project_id.as_deref().map(remote_project_id),
            created_at: patch.created_at,
        }
    }
}

fn remote_project_id(project_id: &str) -> Option<String> {
    match project_id {
        INBOX_PROJECT_ID => None,
        id => Some(id.to_string()),
    }
}

/// JSON client for the hosted backend. Implements both [`RemoteSource`] and
/// [`AuthProvider`]; the access token of the last sign-in is cached in the
/// data directory and restored on the next start.
pub struct RestClient {
    client: Client,
    config: RemoteConfig,
    session_file: PathBuf,
    session: RwLock<Option<SavedSession>>,
    identity: watch::Sender<Option<Identity>>,
}

impl RestClient {
    /// Creates a client and restores a cached session, if any.
    ///
    /// An unreadable session file is logged and ignored.
    ///
    /// # Errors
    ///
    /// Fails when the data directory cannot be resolved or the HTTP client
    /// cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let session_file = DataStorage::new().get_path(SESSION_FILE)?;
        let session = match read_session(&session_file) {
            Ok(session) => session,
            Err(e) => {
                msg_warning!(Message::SessionReadFailed(e.to_string()));
                None
            }
        };
        let (identity, _) = watch::channel(session.as_ref().map(|s| s.user.clone()));

        Ok(Self {
            client: Client::new(),
            config: config.clone(),
            session_file,
            session: RwLock::new(session),
            identity,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = match self.session.read().as_ref() {
            Some(session) => session.access_token.clone(),
            None => msg_bail_anyhow!(Message::NotSignedIn),
        };
        Ok(builder.header(API_KEY_HEADER, &self.config.api_key).header(header::AUTHORIZATION, format!("Bearer {}", token)))
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        let res = builder.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("{} {}", status, body);
        }
        Ok(res.json::<T>().await?)
    }

    async fn send_empty(builder: RequestBuilder) -> Result<()> {
        let res = builder.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("{} {}", status, body);
        }
        Ok(())
    }

    async fn authenticate(&self, path: &str, email: &str, password: &str) -> Result<Identity> {
        let builder = self
            .client
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&Credentials { email, password });
        let session: SavedSession = Self::send_json(builder).await?;
        write_session(&self.session_file, &session)?;

        let identity = session.user.clone();
        *self.session.write() = Some(session);
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }
}

fn read_session(path: &Path) -> Result<Option<SavedSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

fn write_session(path: &Path, session: &SavedSession) -> Result<()> {
    fs::write(path, serde_json::to_string(session)?)?;
    Ok(())
}

#[async_trait]
impl RemoteSource for RestClient {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        let builder = self.authorized(self.client.get(self.url(TASKS_URL)))?;
        let rows: Vec<TaskRow> = Self::send_json(builder).await?;
        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        let builder = self.authorized(self.client.get(self.url(PROJECTS_URL)))?;
        Self::send_json(builder).await
    }

    async fn create_task(&self, task: &Task) -> Result<Task> {
        let builder = self.authorized(self.client.post(self.url(TASKS_URL)))?.json(&TaskRow::from_task(task));
        let row: TaskRow = Self::send_json(builder).await?;
        row.into_task()
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        let url = self.url(&format!("{}/{}", TASKS_URL, id));
        let builder = self.authorized(self.client.patch(url))?.json(&TaskRowPatch::from(patch));
        let row: TaskRow = Self::send_json(builder).await?;
        row.into_task()
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("{}/{}", TASKS_URL, id));
        Self::send_empty(self.authorized(self.client.delete(url))?).await
    }

    async fn create_project(&self, project: &Project) -> Result<Project> {
        let builder = self.authorized(self.client.post(self.url(PROJECTS_URL)))?.json(project);
        Self::send_json(builder).await
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project> {
        let url = self.url(&format!("{}/{}", PROJECTS_URL, id));
        Self::send_json(self.authorized(self.client.patch(url))?.json(patch)).await
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("{}/{}", PROJECTS_URL, id));
        Self::send_empty(self.authorized(self.client.delete(url))?).await
    }
}

#[async_trait]
impl AuthProvider for RestClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        self.authenticate(SIGN_IN_URL, email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        self.authenticate(SIGN_UP_URL, email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        // The local session goes away even if the backend call fails.
        let revoke = match self.authorized(self.client.post(self.url(SIGN_OUT_URL))) {
            Ok(builder) => Self::send_empty(builder).await,
            Err(e) => Err(e),
        };
        *self.session.write() = None;
        if self.session_file.exists() {
            fs::remove_file(&self.session_file)?;
        }
        self.identity.send_replace(None);
        revoke
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_without_quadrant_is_neither_and_null_project_is_inbox() {
        let row: TaskRow = serde_json::from_str(r#"{"id":"t1","title":"  Call bank ","done":false,"projectId":null}"#).unwrap();
        let task = row.into_task().unwrap();
        assert_eq!(task.quadrant(), Quadrant::Neither);
        assert_eq!(task.project_id, INBOX_PROJECT_ID);
        assert_eq!(task.title, "Call bank");
    }

    #[test]
    fn patch_encodes_quadrant_only_when_both_flags_are_known() {
        let row = TaskRowPatch::from(&TaskPatch::quadrant(Quadrant::Urgent));
        assert_eq!(row.quadrant.as_deref(), Some("Q3"));

        let done = TaskRowPatch::from(&TaskPatch {
            done: Some(true),
            ..Default::default()
        });
        assert!(done.quadrant.is_none());
        assert_eq!(serde_json::to_string(&done).unwrap(), r#"{"done":true}"#);
    }

    #[test]
    fn inbox_is_sent_as_null() {
        let patch = TaskPatch {
            project_id: Some(INBOX_PROJECT_ID.to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&TaskRowPatch::from(&patch)).unwrap(), r#"{"projectId":null}"#);
    }
}
