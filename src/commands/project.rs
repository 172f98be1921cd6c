use super::{open_app, resolve_project, settle};
use crate::libs::app::{App, Commit};
use crate::libs::messages::Message;
use crate::libs::store::Change;
use crate::libs::task::Project;
use crate::libs::view::View;
use crate::{msg_print, msg_success, msg_warning};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    command: ProjectCommand,
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    #[command(about = "Create a project")]
    Add {
        #[arg(required = true)]
        name: String,
        #[arg(short, long)]
        emoji: Option<String>,
    },
    #[command(about = "Rename a project")]
    Rename {
        #[arg(required = true)]
        project: String,
        #[arg(required = true)]
        name: String,
        #[arg(short, long)]
        emoji: Option<String>,
    },
    #[command(about = "Delete a project, moving its tasks to the inbox")]
    Rm {
        #[arg(required = true)]
        project: String,
    },
    #[command(about = "List projects")]
    Ls,
    #[command(about = "Show only one project's tasks ('all' for every task)")]
    Select {
        #[arg(required = true)]
        project: String,
    },
}

pub fn add(app: &App, name: &str, emoji: Option<&str>) -> Option<Commit> {
    let commit = app.add_project(name, emoji);
    match &commit.change {
        Some(Change::ProjectCreated(project)) => msg_success!(Message::ProjectAdded(project.display_name())),
        _ => msg_warning!(Message::EmptyTitle),
    }
    Some(commit)
}

pub fn rename(app: &App, reference: &str, name: &str, emoji: Option<&str>) -> Result<Option<Commit>> {
    let id = resolve_project(&app.snapshot(), reference)?;
    let commit = app.rename_project(&id, name, emoji);
    match commit.snapshot.project(&id) {
        Some(project) if commit.applied() => msg_success!(Message::ProjectRenamed(project.display_name())),
        _ => msg_warning!(Message::ProjectProtected(id.clone())),
    }
    Ok(Some(commit))
}

pub fn remove(app: &App, reference: &str) -> Result<Option<Commit>> {
    let id = resolve_project(&app.snapshot(), reference)?;
    if Project::is_reserved(&id) {
        msg_warning!(Message::ProjectProtected(id));
        return Ok(None);
    }
    let commit = app.delete_project(&id);
    if let Some(Change::ProjectDeleted { project, .. }) = &commit.change {
        msg_success!(Message::ProjectDeleted(project.name.clone()));
    }
    Ok(Some(commit))
}

pub fn select(app: &App, reference: &str) -> Result<Option<Commit>> {
    let id = resolve_project(&app.snapshot(), reference)?;
    let commit = app.set_selected_project(&id);
    if let Some(project) = commit.snapshot.selected_project() {
        msg_success!(Message::ProjectSelected(project.display_name()));
    }
    Ok(Some(commit))
}

pub async fn cmd(args: ProjectArgs) -> Result<()> {
    let app = open_app().await?;
    let commit = match args.command {
        ProjectCommand::Add { name, emoji } => add(&app, &name, emoji.as_deref()),
        ProjectCommand::Rename { project, name, emoji } => rename(&app, &project, &name, emoji.as_deref())?,
        ProjectCommand::Rm { project } => remove(&app, &project)?,
        ProjectCommand::Select { project } => select(&app, &project)?,
        ProjectCommand::Ls => {
            msg_print!(Message::ProjectsHeader);
            View::projects(&app.snapshot());
            None
        }
    };
    if let Some(commit) = commit {
        settle(commit).await;
    }
    Ok(())
}
