//! Display implementation for eisen application messages.
//!
//! All user-facing text is defined here, in one match, so the wording stays
//! consistent between one-shot commands, the interactive shell and the logs.
//!
//! ```rust
//! use eisen::libs::messages::Message;
//!
//! assert_eq!(Message::TaskAdded("Pay rent".into()).to_string(), "Task 'Pay rent' added");
//! ```

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TASK MESSAGES ===
            Message::TaskAdded(title) => format!("Task '{}' added", title),
            Message::TaskUpdated(title) => format!("Task '{}' updated", title),
            Message::TaskCompleted(title) => format!("Task '{}' marked as done", title),
            Message::TaskReopened(title) => format!("Task '{}' reopened", title),
            Message::TaskDeleted(title) => format!("Task '{}' deleted", title),
            Message::TaskRestored(title) => format!("Task '{}' restored", title),
            Message::TaskMovedToQuadrant(title, quadrant) => format!("Task '{}' moved to {}", title, quadrant),
            Message::TaskMovedToProject(title, project) => format!("Task '{}' moved to project {}", title, project),
            Message::TaskReordered(title) => format!("Task '{}' reordered", title),
            Message::TaskNotFound(id) => format!("Task '{}' not found", id),
            Message::TaskNotMoved(title) => format!("Task '{}' is already at the edge of its group", title),
            Message::TasksEmpty => "No tasks here yet".to_string(),
            Message::EmptyTitle => "Task title cannot be empty".to_string(),
            Message::InvalidQuadrant(key) => {
                format!("Unknown quadrant '{}'. Use one of: uv (important+urgent), v (important), u (urgent), o (neither)", key)
            }
            Message::NothingToUndo => "Nothing to undo".to_string(),
            Message::UndoAvailable(title, secs) => format!("Deleted '{}'. Type 'undo' within {}s to restore it", title, secs),
            Message::UndoExpired => "Undo window has expired".to_string(),

            // === PROJECT MESSAGES ===
            Message::ProjectAdded(name) => format!("Project '{}' added", name),
            Message::ProjectRenamed(name) => format!("Project renamed to '{}'", name),
            Message::ProjectDeleted(name) => format!("Project '{}' deleted, its tasks moved to Inbox", name),
            Message::ProjectProtected(id) => format!("Project '{}' is reserved and cannot be changed", id),
            Message::ProjectNotFound(id) => format!("Project '{}' not found", id),
            Message::ProjectSelected(name) => format!("Showing project {}", name),
            Message::ProjectsHeader => "Projects:".to_string(),

            // === PREFERENCE MESSAGES ===
            Message::ViewModeSet(mode) => format!("View mode set to {}", mode),
            Message::FiltersSet(important, urgent) => format!(
                "Filters: important={}, urgent={}",
                if *important { "on" } else { "off" },
                if *urgent { "on" } else { "off" }
            ),
            Message::CompactModeSet(on) => format!("Compact mode {}", if *on { "enabled" } else { "disabled" }),
            Message::Progress(done, total, percent) => format!("Progress {}/{} ({}%)", done, total, percent),

            // === AUTH MESSAGES ===
            Message::SignedIn(who) => format!("Signed in as {}", who),
            Message::SignedUp(who) => format!("Account created for {}", who),
            Message::SignedOut => "Signed out. Local tasks are kept on this device".to_string(),
            Message::NotSignedIn => "Not signed in, working offline".to_string(),
            Message::SignInFailed(e) => format!("Sign in failed: {}", e),
            Message::SignOutFailed(e) => format!("Sign out failed: {}", e),
            Message::RemoteNotConfigured => "Remote backend is not configured. Run 'eisen init' first".to_string(),
            Message::SessionReadFailed(e) => format!("Failed to read the saved session: {}", e),
            Message::AuthStateChanged(state) => format!("Auth state: {}", state),

            // === SYNC MESSAGES ===
            Message::ReloadStarted(user) => format!("Loading tasks and projects for {}", user),
            Message::ReloadCompleted(projects, tasks) => format!("Loaded {} project(s) and {} task(s) from remote", projects, tasks),
            Message::ReloadFailed(e) => format!("Remote reload failed, keeping local data: {}", e),
            Message::RemoteWriteFailed(op, e) => format!("Remote {} failed: {}", op, e),
            Message::IdReconciled(local, server) => format!("Task id {} confirmed by server as {}", local, server),
            Message::ConfirmationDropped(id) => format!("Server confirmation for task {} ignored, task no longer exists locally", id),
            Message::RemoteWriteDeferred(op, id) => format!("Remote {} for task {} held until the server confirms it", op, id),
            Message::CreateRevoked(local, server) => format!("Task {} was deleted before the server confirmed it, removing {}", local, server),
            Message::AuthWatcherStopped => "Auth state subscription closed".to_string(),

            // === PERSISTENCE MESSAGES ===
            Message::StateLoaded(tasks) => format!("Restored {} task(s) from local storage", tasks),
            Message::StateLoadFailed(e) => format!("Failed to load local state: {}", e),
            Message::StateSaveFailed(e) => format!("Failed to save local state: {}", e),
            Message::StaleWriteSkipped(revision) => format!("Skipped stale state write at revision {}", revision),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved".to_string(),
            Message::ConfigModuleRemote => "Remote backend settings".to_string(),
            Message::ConfigModuleSync => "Sync settings".to_string(),
            Message::ConfigModuleUi => "Display settings".to_string(),
            Message::PromptSelectModules => "Select modules to configure".to_string(),
            Message::PromptApiUrl => "Enter the remote API URL".to_string(),
            Message::PromptApiKey => "Enter the remote API key".to_string(),
            Message::PromptSyncTimeout => "Enter the remote call timeout (seconds)".to_string(),
            Message::PromptUndoWindow => "Enter the undo window after delete (seconds)".to_string(),
            Message::PromptCompactMode => "Use compact mode by default?".to_string(),
            Message::PromptEmail => "Email".to_string(),
            Message::PromptPassword => "Password".to_string(),

            // === SHELL MESSAGES ===
            Message::ShellWelcome => "eisen shell. Type 'help' for commands, 'quit' to leave".to_string(),
            Message::ShellPrompt => "eisen".to_string(),
            Message::ShellHelp => [
                "add <title> [@uv|@v|@u|@o]   add a task, optionally into a quadrant",
                "ls | matrix                  show the list or the matrix view",
                "done <n>                     toggle done for task number n",
                "edit <n> <title>             change the title",
                "rm <n>                       delete, restorable with 'undo'",
                "undo                         restore the last deleted task",
                "mv <n> <uv|v|u|o>            move to a quadrant",
                "up <n> | down <n>            reorder within the current group",
                "project <name>               select a project ('all' for every task)",
                "filter [i] [u]               filter by important and/or urgent",
                "stats                        show progress",
                "quit",
            ]
            .join("\n"),
            Message::ShellUnknownCommand(cmd) => format!("Unknown command '{}'", cmd),
            Message::ShellUsage(usage) => format!("Usage: {}", usage),
            Message::ShellBye => "Bye".to_string(),
        };
        write!(f, "{}", text)
    }
}
