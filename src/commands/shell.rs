//! Interactive session.
//!
//! One [`App`] lives for the whole session, so the undo slot and the auth
//! watcher stay alive between commands. `undo` only works within the
//! configured window after the delete.

use super::{open_app, prefs, project, render, settle, task};
use crate::libs::app::{App, Commit};
use crate::libs::messages::Message;
use crate::libs::store::ViewMode;
use crate::libs::view::View;
use crate::{msg_error, msg_print};
use anyhow::Result;
use std::io::Write;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Splits a trailing `@key` off an `add` line.
pub fn split_quadrant(words: &[&str]) -> (String, Option<String>) {
    match words.split_last() {
        Some((last, rest)) if last.starts_with('@') && last.len() > 1 => (rest.join(" "), Some(last[1..].to_string())),
        _ => (words.join(" "), None),
    }
}

struct Session {
    app: App,
    /// Commits whose background work may still be running.
    pending: Vec<Commit>,
    deleted_at: Option<Instant>,
}

impl Session {
    fn new(app: App) -> Self {
        Session {
            app,
            pending: Vec::new(),
            deleted_at: None,
        }
    }

    /// Settles the commits that are already done and keeps the rest.
    async fn reap(&mut self) {
        let (finished, running): (Vec<Commit>, Vec<Commit>) = std::mem::take(&mut self.pending).into_iter().partition(Commit::is_finished);
        self.pending = running;
        for commit in finished {
            settle(commit).await;
        }
    }

    fn keep(&mut self, commit: Option<Commit>) -> bool {
        match commit {
            Some(commit) => {
                let applied = commit.applied();
                self.pending.push(commit);
                applied
            }
            None => false,
        }
    }

    fn usage(usage: &str) {
        msg_error!(Message::ShellUsage(usage.to_string()));
    }

    /// Runs one line. Returns false when the session should end.
    async fn dispatch(&mut self, line: &str) -> Result<bool> {
        self.reap().await;
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return Ok(true);
        };

        let changed = match (command, args) {
            ("quit" | "exit" | "q", _) => return Ok(false),
            ("help" | "?", _) => {
                msg_print!(Message::ShellHelp);
                false
            }
            ("ls" | "list", _) => {
                render(&self.app.snapshot(), None);
                false
            }
            ("matrix", _) => {
                render(&self.app.snapshot(), Some(ViewMode::Matrix));
                false
            }
            ("add", []) => {
                Self::usage("add <title> [@uv|@v|@u|@o]");
                false
            }
            ("add", words) => {
                let (title, key) = split_quadrant(words);
                let commit = task::add(&self.app, &title, key.as_deref(), None)?;
                self.keep(commit)
            }
            ("done", [n]) => {
                let commit = task::toggle(&self.app, n)?;
                self.keep(commit)
            }
            ("edit", [n, title @ ..]) if !title.is_empty() => {
                let commit = task::edit(&self.app, n, &title.join(" "))?;
                self.keep(commit)
            }
            ("rm", [n]) => {
                let commit = task::remove(&self.app, n)?;
                let title = commit.as_ref().and_then(|c| c.snapshot.last_deleted.peek()).map(|t| t.title.clone());
                let applied = self.keep(commit);
                if applied {
                    self.deleted_at = Some(Instant::now());
                    if let Some(title) = title {
                        msg_print!(Message::UndoAvailable(title, self.app.undo_window().as_secs()));
                    }
                }
                applied
            }
            ("undo", []) => match self.deleted_at.take() {
                Some(at) if at.elapsed() <= self.app.undo_window() => {
                    let commit = task::undo(&self.app);
                    self.keep(Some(commit))
                }
                Some(_) => {
                    msg_print!(Message::UndoExpired);
                    false
                }
                None => {
                    msg_print!(Message::NothingToUndo);
                    false
                }
            },
            ("mv", [n, key]) => {
                let commit = task::move_to_quadrant(&self.app, n, key)?;
                self.keep(commit)
            }
            ("up", [n]) => {
                let commit = task::shift(&self.app, n, true)?;
                self.keep(commit)
            }
            ("down", [n]) => {
                let commit = task::shift(&self.app, n, false)?;
                self.keep(commit)
            }
            ("project", []) | ("projects", _) => {
                msg_print!(Message::ProjectsHeader);
                View::projects(&self.app.snapshot());
                false
            }
            ("project", name) => {
                let commit = project::select(&self.app, &name.join(" "))?;
                self.keep(commit)
            }
            ("view", [mode]) => match prefs::parse_view(mode) {
                Some(mode) => {
                    prefs::set_view(&self.app, mode).await;
                    true
                }
                None => false,
            },
            ("filter", flags) => {
                let important = flags.iter().any(|f| matches!(*f, "i" | "important"));
                let urgent = flags.iter().any(|f| matches!(*f, "u" | "urgent"));
                prefs::set_filters(&self.app, important, urgent).await;
                true
            }
            ("compact", []) => {
                prefs::set_compact(&self.app, None).await;
                true
            }
            ("stats", _) => {
                prefs::print_stats(&self.app);
                false
            }
            ("done" | "rm" | "up" | "down", _) => {
                Self::usage(&format!("{} <n>", command));
                false
            }
            ("edit", _) => {
                Self::usage("edit <n> <title>");
                false
            }
            ("mv", _) => {
                Self::usage("mv <n> <uv|v|u|o>");
                false
            }
            (other, _) => {
                msg_error!(Message::ShellUnknownCommand(other.to_string()));
                false
            }
        };

        if changed {
            render(&self.app.snapshot(), None);
        }
        Ok(true)
    }

    async fn close(self) {
        for commit in self.pending {
            settle(commit).await;
        }
    }
}

pub async fn cmd() -> Result<()> {
    let app = open_app().await?;
    let mut session = Session::new(app);
    msg_print!(Message::ShellWelcome);
    render(&session.app.snapshot(), None);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", Message::ShellPrompt);
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match session.dispatch(&line).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => msg_error!(e),
        }
    }

    msg_print!(Message::ShellBye);
    session.close().await;
    Ok(())
}
