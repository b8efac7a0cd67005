use std::io::Write;

use anyhow::{Context, Result};
use colored::Colorize;
use tabula_application::ChatFlow;
use tabula_core::TabulaError;
use tabula_core::auth::Route;

use super::{cancel_on_ctrl_c, stdin_lines};
use crate::context::AppContext;
use crate::render;

const HELP: &str = "Type a question and press Enter. /clear starts over, /quit leaves.";

/// Reads questions from stdin until end of input or `/quit`.
pub async fn run(ctx: &AppContext, project_id: i64, file_id: i64) -> Result<()> {
    ctx.require(Route::FileChat {
        project_id,
        file_id,
    })
    .await?;

    let detail = ctx.data.project_detail(project_id).await?;
    let file = detail
        .file(file_id)
        .with_context(|| format!("Project {} has no file {}", project_id, file_id))?;

    println!("{} {}", "Chatting with".bold(), file.filename.cyan());
    println!("{}", HELP.dimmed());

    let mut lines = stdin_lines();
    let mut flow = ChatFlow::new(file_id, ctx.data.clone());

    loop {
        print!("{} ", "you>".bright_blue().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                flow.clear();
                println!("{}", "Conversation cleared".dimmed());
                continue;
            }
            "/help" => {
                println!("{}", HELP.dimmed());
                continue;
            }
            _ => {}
        }

        let interrupt = cancel_on_ctrl_c(flow.cancellation_token());
        let outcome = flow.send(&line).await;
        interrupt.abort();

        match outcome {
            Ok(Some(answer)) => render::chat_message(&answer),
            Ok(None) => {}
            Err(TabulaError::Cancelled) => {
                println!("{}", "Cancelled".yellow());
                // A cancelled token stays cancelled; carry the transcript into a fresh flow.
                let conversation = flow.conversation();
                flow = ChatFlow::resume(conversation, ctx.data.clone());
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
