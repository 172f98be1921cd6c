pub mod auth;
pub mod init;
pub mod prefs;
pub mod project;
pub mod shell;
pub mod task;

use crate::api::{Disconnected, RestClient};
use crate::db::state::SqliteStorage;
use crate::libs::app::{App, AppOptions, Commit};
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::store::{StoreState, ViewMode};
use crate::libs::task::ALL_PROJECT_ID;
use crate::libs::view::View;
use crate::{msg_bail_anyhow, msg_debug, msg_info, msg_print};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Create an account on the remote backend")]
    Signup(auth::AuthArgs),
    #[command(about = "Sign in and load your tasks from the remote backend")]
    Login(auth::AuthArgs),
    #[command(about = "Sign out, keeping local tasks")]
    Logout,
    #[command(about = "Add a task")]
    Add(task::AddArgs),
    #[command(about = "Show tasks as a list", visible_alias = "ls")]
    List,
    #[command(about = "Show tasks as an Eisenhower matrix")]
    Matrix,
    #[command(about = "Toggle a task done")]
    Done(task::TaskRef),
    #[command(about = "Change a task title")]
    Edit(task::EditArgs),
    #[command(about = "Delete a task")]
    Rm(task::TaskRef),
    #[command(about = "Move a task to another quadrant or project")]
    Mv(task::MoveArgs),
    #[command(about = "Move a task up within its group")]
    Up(task::TaskRef),
    #[command(about = "Move a task down within its group")]
    Down(task::TaskRef),
    #[command(about = "Manage projects", arg_required_else_help = true)]
    Project(project::ProjectArgs),
    #[command(about = "Set the default view")]
    View(prefs::ViewArgs),
    #[command(about = "Filter tasks by importance and urgency")]
    Filter(prefs::FilterArgs),
    #[command(about = "Toggle compact layout")]
    Compact(prefs::CompactArgs),
    #[command(about = "Show completion progress")]
    Stats,
    #[command(about = "Interactive session with undo")]
    Shell,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Signup(args) => auth::signup(args).await,
            Commands::Login(args) => auth::login(args).await,
            Commands::Logout => auth::logout().await,
            Commands::Add(args) => task::add_cmd(args).await,
            Commands::List => show(Some(ViewMode::List)).await,
            Commands::Matrix => show(Some(ViewMode::Matrix)).await,
            Commands::Done(args) => task::done_cmd(args).await,
            Commands::Edit(args) => task::edit_cmd(args).await,
            Commands::Rm(args) => task::rm_cmd(args).await,
            Commands::Mv(args) => task::mv_cmd(args).await,
            Commands::Up(args) => task::up_cmd(args).await,
            Commands::Down(args) => task::down_cmd(args).await,
            Commands::Project(args) => project::cmd(args).await,
            Commands::View(args) => prefs::view_cmd(args).await,
            Commands::Filter(args) => prefs::filter_cmd(args).await,
            Commands::Compact(args) => prefs::compact_cmd(args).await,
            Commands::Stats => prefs::stats_cmd().await,
            Commands::Shell => shell::cmd().await,
        }
    }
}

/// Builds the session from the config file: SQLite state plus the REST
/// backend when one is configured.
pub async fn open_app() -> Result<App> {
    let config = Config::read()?;
    let options = AppOptions::from(&config);
    let storage = Arc::new(SqliteStorage::new()?);
    let app = match config.remote() {
        Some(remote) => {
            let client = Arc::new(RestClient::new(remote)?);
            App::start(options, storage, client.clone(), client).await
        }
        None => {
            let disconnected = Arc::new(Disconnected::new());
            App::start(options, storage, disconnected.clone(), disconnected).await
        }
    };
    Ok(app)
}

/// Waits for the background phases of a one-shot command. Remote failures
/// are already logged by the sync engine.
pub async fn settle(commit: Commit) {
    if let Err(e) = commit.settle().await {
        msg_debug!(e);
    }
}

/// Resolves a task reference: a 1-based number from the current view, a
/// full id, or an unambiguous id prefix.
pub fn resolve_task(state: &StoreState, reference: &str) -> Result<String> {
    let reference = reference.trim();
    let visible = state.visible_tasks();
    if let Ok(num) = reference.parse::<usize>() {
        if num >= 1 && num <= visible.len() {
            return Ok(visible[num - 1].id.clone());
        }
    }
    if let Some(task) = state.task(reference) {
        return Ok(task.id.clone());
    }
    let mut matches = state.tasks.iter().filter(|t| !reference.is_empty() && t.id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.id.clone()),
        _ => msg_bail_anyhow!(Message::TaskNotFound(reference.to_string())),
    }
}

/// Resolves a project by id or case-insensitive name.
pub fn resolve_project(state: &StoreState, reference: &str) -> Result<String> {
    let reference = reference.trim();
    if let Some(project) = state.project(reference) {
        return Ok(project.id.clone());
    }
    match state.projects.iter().find(|p| p.name.eq_ignore_ascii_case(reference)) {
        Some(project) => Ok(project.id.clone()),
        None => msg_bail_anyhow!(Message::ProjectNotFound(reference.to_string())),
    }
}

/// Prints the tasks in the given or stored view mode, then progress.
pub fn render(state: &StoreState, mode: Option<ViewMode>) {
    if state.selected_project_id != ALL_PROJECT_ID {
        if let Some(project) = state.selected_project() {
            msg_print!(Message::ProjectSelected(project.display_name()));
        }
    }
    if state.visible_tasks().is_empty() {
        msg_info!(Message::TasksEmpty);
        return;
    }
    match mode.unwrap_or(state.view_mode) {
        ViewMode::List => View::tasks(state),
        ViewMode::Matrix => View::matrix(state),
    }
    let stats = state.stats();
    msg_print!(Message::Progress(stats.done, stats.total, stats.percent));
}

async fn show(mode: Option<ViewMode>) -> Result<()> {
    let app = open_app().await?;
    render(&app.snapshot(), mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::store::{AddTaskOptions, TaskStore};

    #[test]
    fn task_references_resolve_by_number_id_and_prefix() {
        let mut store = TaskStore::new(false);
        store.add_task("first", AddTaskOptions::default());
        store.add_task("second", AddTaskOptions::default());
        let state = store.snapshot();
        let top = state.visible_tasks()[0].id.clone();

        assert_eq!(resolve_task(&state, "1").unwrap(), top);
        assert_eq!(resolve_task(&state, &top).unwrap(), top);
        assert_eq!(resolve_task(&state, &top[..12]).unwrap(), top);
        assert!(resolve_task(&state, "3").is_err());
        assert!(resolve_task(&state, "").is_err());
    }

    #[test]
    fn projects_resolve_by_name_ignoring_case() {
        let mut store = TaskStore::new(false);
        store.add_project("Garden", None);
        let state = store.snapshot();
        let garden = state.projects.last().unwrap().id.clone();

        assert_eq!(resolve_project(&state, "garden").unwrap(), garden);
        assert_eq!(resolve_project(&state, "inbox").unwrap(), "inbox");
        assert!(resolve_project(&state, "work").is_err());
    }
}
