use super::{open_app, settle};
use crate::libs::app::App;
use crate::libs::messages::Message;
use crate::libs::store::ViewMode;
use crate::{msg_error, msg_print, msg_success};
use anyhow::Result;
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ViewArg {
    List,
    Matrix,
}

impl From<ViewArg> for ViewMode {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::List => ViewMode::List,
            ViewArg::Matrix => ViewMode::Matrix,
        }
    }
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[arg(value_enum)]
    mode: ViewArg,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Only important tasks
    #[arg(short, long)]
    important: bool,
    /// Only urgent tasks
    #[arg(short, long)]
    urgent: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct CompactArgs {
    /// Omit to flip the current setting
    #[arg(value_enum)]
    state: Option<Switch>,
}

pub async fn set_view(app: &App, mode: ViewMode) {
    let commit = app.set_view_mode(mode);
    msg_success!(Message::ViewModeSet(mode.to_string()));
    settle(commit).await;
}

pub async fn set_filters(app: &App, important: bool, urgent: bool) {
    settle(app.set_filter_important(important)).await;
    settle(app.set_filter_urgent(urgent)).await;
    msg_success!(Message::FiltersSet(important, urgent));
}

pub async fn set_compact(app: &App, value: Option<bool>) {
    let value = value.unwrap_or(!app.snapshot().compact_mode);
    settle(app.set_compact_mode(value)).await;
    msg_success!(Message::CompactModeSet(value));
}

pub fn print_stats(app: &App) {
    let stats = app.snapshot().stats();
    msg_print!(Message::Progress(stats.done, stats.total, stats.percent));
}

pub async fn view_cmd(args: ViewArgs) -> Result<()> {
    let app = open_app().await?;
    set_view(&app, args.mode.into()).await;
    Ok(())
}

pub async fn filter_cmd(args: FilterArgs) -> Result<()> {
    let app = open_app().await?;
    set_filters(&app, args.important, args.urgent).await;
    Ok(())
}

pub async fn compact_cmd(args: CompactArgs) -> Result<()> {
    let app = open_app().await?;
    let value = args.state.map(|s| matches!(s, Switch::On));
    set_compact(&app, value).await;
    Ok(())
}

pub async fn stats_cmd() -> Result<()> {
    let app = open_app().await?;
    print_stats(&app);
    Ok(())
}

/// Parses the shell's `view` argument.
pub fn parse_view(value: &str) -> Option<ViewMode> {
    let mode = ViewMode::parse(value);
    if mode.is_none() {
        msg_error!(Message::ShellUsage("view <list|matrix>".to_string()));
    }
    mode
}
