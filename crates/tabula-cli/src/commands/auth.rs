use std::io::Write;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tabula_core::store::Session;

use super::{cancel_on_ctrl_c, stdin_lines};
use crate::context::AppContext;
use crate::render;

pub async fn login(ctx: &AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = password_or_prompt(password).await?;

    let interrupt = cancel_on_ctrl_c(ctx.auth.cancellation_token());
    let session = ctx.auth.login(email, &password).await;
    interrupt.abort();

    greet(&session?);
    Ok(())
}

pub async fn register(
    ctx: &AppContext,
    email: &str,
    name: Option<&str>,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password).await?;

    let interrupt = cancel_on_ctrl_c(ctx.auth.cancellation_token());
    let session = ctx.auth.register(email, &password, name).await;
    interrupt.abort();

    greet(&session?);
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.auth.logout().await?;
    render::success("Signed out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.auth.restore().await? {
        Session::SignedOut => bail!("Not signed in. Run `tabula login --email <EMAIL>` first."),
        Session::SignedIn { user: Some(user) } => {
            println!("{}", user.email.bold());
            if let Some(name) = &user.name {
                println!("{}", name);
            }
        }
        Session::SignedIn { user: None } => {
            println!(
                "{}",
                "Signed in, but the backend could not be reached to load your profile.".yellow()
            );
        }
    }
    Ok(())
}

fn greet(session: &Session) {
    match session.user() {
        Some(user) => render::success(&format!(
            "Signed in as {}",
            user.name.as_deref().unwrap_or(&user.email)
        )),
        None => render::success("Signed in"),
    }
}

async fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    std::io::stderr().flush()?;
    stdin_lines()
        .next_line()
        .await?
        .context("No password given")
}
