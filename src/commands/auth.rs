use super::open_app;
use crate::libs::app::App;
use crate::libs::messages::Message;
use crate::{msg_error, msg_info, msg_success};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input, Password};

#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Account email; prompted when omitted
    #[arg(short, long)]
    email: Option<String>,
}

fn credentials(args: &AuthArgs) -> Result<(String, String)> {
    let email = match &args.email {
        Some(email) => email.clone(),
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptEmail.to_string())
            .interact_text()?,
    };
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptPassword.to_string())
        .interact()?;
    Ok((email, password))
}

fn report_reload(app: &App) {
    let state = app.snapshot();
    msg_info!(Message::ReloadCompleted(state.projects.len(), state.tasks.len()));
}

pub async fn login(args: AuthArgs) -> Result<()> {
    let app = open_app().await?;
    let (email, password) = credentials(&args)?;
    match app.sign_in(&email, &password).await {
        Ok(identity) => {
            msg_success!(Message::SignedIn(identity.display().to_string()));
            report_reload(&app);
        }
        Err(e) => msg_error!(Message::SignInFailed(e.to_string())),
    }
    Ok(())
}

pub async fn signup(args: AuthArgs) -> Result<()> {
    let app = open_app().await?;
    let (email, password) = credentials(&args)?;
    match app.sign_up(&email, &password).await {
        Ok(identity) => {
            msg_success!(Message::SignedUp(identity.display().to_string()));
            report_reload(&app);
        }
        Err(e) => msg_error!(Message::SignInFailed(e.to_string())),
    }
    Ok(())
}

pub async fn logout() -> Result<()> {
    let app = open_app().await?;
    if app.auth_state().identity().is_none() {
        msg_info!(Message::NotSignedIn);
        return Ok(());
    }
    match app.sign_out().await {
        Ok(()) => msg_success!(Message::SignedOut),
        Err(e) => msg_error!(Message::SignOutFailed(e.to_string())),
    }
    Ok(())
}
