use super::{open_app, render, resolve_project, resolve_task, settle};
use crate::libs::app::{App, Commit};
use crate::libs::messages::Message;
use crate::libs::quadrant::Quadrant;
use crate::libs::store::{AddTaskOptions, Change};
use crate::libs::task::ALL_PROJECT_ID;
use crate::{msg_error, msg_info, msg_success, msg_warning};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(required = true, num_args = 1..)]
    title: Vec<String>,
    /// Quadrant key: uv, v, u or o
    #[arg(short, long)]
    quadrant: Option<String>,
    /// Project id or name
    #[arg(short, long)]
    project: Option<String>,
}

#[derive(Debug, Args)]
pub struct TaskRef {
    /// Task number from the list, or a task id
    #[arg(required = true)]
    task: String,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(required = true)]
    task: String,
    #[arg(required = true, num_args = 1..)]
    title: Vec<String>,
}

#[derive(Debug, Args)]
#[command(arg_required_else_help = true)]
pub struct MoveArgs {
    #[arg(required = true)]
    task: String,
    /// Target quadrant: uv, v, u or o
    quadrant: Option<String>,
    /// Target project id or name
    #[arg(short, long)]
    project: Option<String>,
}

pub fn add(app: &App, title: &str, quadrant: Option<&str>, project: Option<&str>) -> Result<Option<Commit>> {
    if title.trim().is_empty() {
        msg_warning!(Message::EmptyTitle);
        return Ok(None);
    }
    let quadrant = match quadrant {
        Some(key) => match Quadrant::parse(key) {
            Some(quadrant) => Some(quadrant),
            None => {
                msg_error!(Message::InvalidQuadrant(key.to_string()));
                return Ok(None);
            }
        },
        None => None,
    };
    let project_id = match project {
        Some(reference) => Some(resolve_project(&app.snapshot(), reference)?),
        None => None,
    };

    let commit = app.add_task(title, AddTaskOptions { quadrant, project_id });
    if let Some(Change::TaskCreated(task)) = &commit.change {
        msg_success!(Message::TaskAdded(task.title.clone()));
    }
    Ok(Some(commit))
}

pub fn toggle(app: &App, reference: &str) -> Result<Option<Commit>> {
    let id = resolve_task(&app.snapshot(), reference)?;
    let commit = app.toggle_done(&id);
    if let Some(task) = commit.snapshot.task(&id) {
        if task.done {
            msg_success!(Message::TaskCompleted(task.title.clone()));
        } else {
            msg_info!(Message::TaskReopened(task.title.clone()));
        }
    }
    Ok(Some(commit))
}

pub fn edit(app: &App, reference: &str, title: &str) -> Result<Option<Commit>> {
    let id = resolve_task(&app.snapshot(), reference)?;
    let commit = app.edit_title(&id, title);
    if !commit.applied() {
        msg_warning!(Message::EmptyTitle);
        return Ok(None);
    }
    if let Some(task) = commit.snapshot.task(&id) {
        msg_success!(Message::TaskUpdated(task.title.clone()));
    }
    Ok(Some(commit))
}

pub fn remove(app: &App, reference: &str) -> Result<Option<Commit>> {
    let id = resolve_task(&app.snapshot(), reference)?;
    let commit = app.delete_task(&id);
    if let Some(Change::TaskDeleted(task)) = &commit.change {
        msg_success!(Message::TaskDeleted(task.title.clone()));
    }
    Ok(Some(commit))
}

pub fn undo(app: &App) -> Commit {
    let commit = app.undo_delete();
    match &commit.change {
        Some(Change::TaskRestored(task)) => msg_success!(Message::TaskRestored(task.title.clone())),
        _ => msg_info!(Message::NothingToUndo),
    }
    commit
}

pub fn move_to_quadrant(app: &App, reference: &str, key: &str) -> Result<Option<Commit>> {
    let id = resolve_task(&app.snapshot(), reference)?;
    let Some(quadrant) = Quadrant::parse(key) else {
        msg_error!(Message::InvalidQuadrant(key.to_string()));
        return Ok(None);
    };
    let commit = app.move_to_quadrant(&id, key);
    if let Some(task) = commit.snapshot.task(&id) {
        msg_success!(Message::TaskMovedToQuadrant(task.title.clone(), quadrant.label().to_string()));
    }
    Ok(Some(commit))
}

pub fn move_to_project(app: &App, reference: &str, project: &str) -> Result<Option<Commit>> {
    let state = app.snapshot();
    let id = resolve_task(&state, reference)?;
    let project_id = resolve_project(&state, project)?;
    let commit = app.move_to_project(&id, &project_id);
    match (commit.applied(), commit.snapshot.task(&id), commit.snapshot.project(&project_id)) {
        (true, Some(task), Some(project)) => msg_success!(Message::TaskMovedToProject(task.title.clone(), project.display_name())),
        (false, _, _) if project_id == ALL_PROJECT_ID => msg_warning!(Message::ProjectProtected(project_id.clone())),
        _ => {}
    }
    Ok(Some(commit))
}

pub fn shift(app: &App, reference: &str, up: bool) -> Result<Option<Commit>> {
    let id = resolve_task(&app.snapshot(), reference)?;
    let commit = if up { app.move_up(&id) } else { app.move_down(&id) };
    if let Some(task) = commit.snapshot.task(&id) {
        if commit.applied() {
            msg_success!(Message::TaskReordered(task.title.clone()));
        } else {
            msg_info!(Message::TaskNotMoved(task.title.clone()));
        }
    }
    Ok(Some(commit))
}

async fn finish(commit: Option<Commit>) -> Result<()> {
    if let Some(commit) = commit {
        let applied = commit.applied();
        let snapshot = commit.snapshot.clone();
        settle(commit).await;
        if applied {
            render(&snapshot, None);
        }
    }
    Ok(())
}

pub async fn add_cmd(args: AddArgs) -> Result<()> {
    let app = open_app().await?;
    let commit = add(&app, &args.title.join(" "), args.quadrant.as_deref(), args.project.as_deref())?;
    finish(commit).await
}

pub async fn done_cmd(args: TaskRef) -> Result<()> {
    let app = open_app().await?;
    let commit = toggle(&app, &args.task)?;
    finish(commit).await
}

pub async fn edit_cmd(args: EditArgs) -> Result<()> {
    let app = open_app().await?;
    let commit = edit(&app, &args.task, &args.title.join(" "))?;
    finish(commit).await
}

pub async fn rm_cmd(args: TaskRef) -> Result<()> {
    let app = open_app().await?;
    let commit = remove(&app, &args.task)?;
    finish(commit).await
}

pub async fn mv_cmd(args: MoveArgs) -> Result<()> {
    let app = open_app().await?;
    let commit = match (&args.quadrant, &args.project) {
        (_, Some(project)) => move_to_project(&app, &args.task, project)?,
        (Some(key), None) => move_to_quadrant(&app, &args.task, key)?,
        (None, None) => {
            msg_error!(Message::ShellUsage("eisen mv <task> <uv|v|u|o> | --project <name>".to_string()));
            None
        }
    };
    finish(commit).await
}

pub async fn up_cmd(args: TaskRef) -> Result<()> {
    let app = open_app().await?;
    let commit = shift(&app, &args.task, true)?;
    finish(commit).await
}

pub async fn down_cmd(args: TaskRef) -> Result<()> {
    let app = open_app().await?;
    let commit = shift(&app, &args.task, false)?;
    finish(commit).await
}
