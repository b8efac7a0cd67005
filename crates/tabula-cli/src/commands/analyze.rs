use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use tabula_application::QuickAnalysisFlow;
use tabula_core::TabulaError;
use tabula_core::analysis::format_size;
use tabula_core::auth::Route;

use super::{cancel_on_ctrl_c, read_selected_file};
use crate::context::AppContext;
use crate::render;

/// Upload → analyze for a file outside any project.
pub async fn run(ctx: &AppContext, path: &str, intent: Option<String>) -> Result<()> {
    ctx.require(Route::QuickAnalysis).await?;

    let file = read_selected_file(path).await?;
    println!(
        "{} {} ({})",
        "Analyzing".bold(),
        file.name.cyan(),
        format_size(file.size)
    );

    let flow = QuickAnalysisFlow::new(ctx.data.clone(), ctx.config.upload.clone())
        .with_stage_callback(Arc::new(render::stage));
    flow.select_file(file)?;
    flow.set_intent(intent)?;

    let interrupt = cancel_on_ctrl_c(flow.cancellation_token());
    let outcome = flow.run().await;
    interrupt.abort();

    match outcome {
        Ok(result) => {
            render::analysis(&result);
            Ok(())
        }
        Err(TabulaError::Cancelled) => {
            println!("{}", "Cancelled".yellow());
            Ok(())
        }
        Err(err) => {
            let message = flow.state().error().map(str::to_string);
            Err(anyhow::anyhow!(message.unwrap_or_else(|| err.to_string())))
        }
    }
}
