use std::sync::Arc;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tabula_application::{FileAnalysisFlow, ProjectFlow};
use tabula_core::TabulaError;
use tabula_core::auth::Route;

use super::{cancel_on_ctrl_c, read_selected_file};
use crate::context::AppContext;
use crate::render;

pub async fn upload(
    ctx: &AppContext,
    project_id: i64,
    path: &str,
    analyze: bool,
    intent: Option<String>,
) -> Result<()> {
    ctx.require(Route::Project(project_id)).await?;
    let file = read_selected_file(path).await?;

    if !analyze {
        let flow = ProjectFlow::new(project_id, ctx.data.clone(), ctx.config.upload.clone())?;
        let interrupt = cancel_on_ctrl_c(flow.cancellation_token());
        let stored = flow.upload_file(&file).await;
        interrupt.abort();

        let stored = stored?;
        render::success(&format!("Uploaded {}", stored.filename.cyan()));
        render::file(&stored);
        return Ok(());
    }

    let flow = file_flow(ctx, project_id);
    flow.select_file(file)?;
    flow.set_intent(intent)?;

    let interrupt = cancel_on_ctrl_c(flow.cancellation_token());
    let outcome = flow.run().await;
    interrupt.abort();

    if let Some((stored, result)) = finish(&flow, outcome)? {
        render::file(&stored);
        render::analysis(&result);
    }
    Ok(())
}

pub async fn analyze(
    ctx: &AppContext,
    project_id: i64,
    file_id: i64,
    intent: Option<String>,
) -> Result<()> {
    ctx.require(Route::FileAnalysis {
        project_id,
        file_id,
    })
    .await?;

    let detail = ctx.data.project_detail(project_id).await?;
    let file = detail
        .file(file_id)
        .with_context(|| format!("Project {} has no file {}", project_id, file_id))?;

    let flow = file_flow(ctx, project_id);
    let interrupt = cancel_on_ctrl_c(flow.cancellation_token());
    let outcome = flow.reanalyze(file, intent).await;
    interrupt.abort();

    if let Some(result) = finish(&flow, outcome)? {
        render::analysis(&result);
    }
    Ok(())
}

pub async fn history(ctx: &AppContext, project_id: i64, file_id: i64) -> Result<()> {
    ctx.require(Route::FileAnalysis {
        project_id,
        file_id,
    })
    .await?;

    let analyses = ctx.data.file_analyses(project_id, file_id).await?;
    if analyses.is_empty() {
        println!("{}", "No saved analyses for this file.".dimmed());
    }
    for entry in &analyses {
        render::history_entry(entry);
    }
    Ok(())
}

pub async fn delete_analysis(
    ctx: &AppContext,
    project_id: i64,
    file_id: i64,
    analysis_id: i64,
) -> Result<()> {
    ctx.require(Route::FileAnalysis {
        project_id,
        file_id,
    })
    .await?;

    ctx.data
        .delete_analysis(project_id, file_id, analysis_id)
        .await?;
    render::success(&format!("Deleted analysis {}", analysis_id));
    Ok(())
}

/// Asks for an explanation of one chart from the file's most recent saved analysis.
pub async fn insight(ctx: &AppContext, project_id: i64, file_id: i64, chart_id: &str) -> Result<()> {
    ctx.require(Route::FileAnalysis {
        project_id,
        file_id,
    })
    .await?;

    let analyses = ctx.data.file_analyses(project_id, file_id).await?;
    let Some(chart) = analyses
        .iter()
        .flat_map(|a| a.charts.iter())
        .find(|c| c.id == chart_id)
    else {
        bail!("No saved chart '{}' for file {}", chart_id, file_id);
    };

    let flow = file_flow(ctx, project_id);
    let interrupt = cancel_on_ctrl_c(flow.cancellation_token());
    let insight = flow.chart_insight(chart, Some(file_id)).await;
    interrupt.abort();

    render::chart_line(chart);
    println!("  {}", insight?.italic());
    Ok(())
}

pub async fn delete(ctx: &AppContext, project_id: i64, file_id: i64) -> Result<()> {
    ctx.require(Route::Project(project_id)).await?;

    let flow = ProjectFlow::new(project_id, ctx.data.clone(), ctx.config.upload.clone())?;
    flow.delete_file(file_id).await?;
    render::success(&format!("Deleted file {}", file_id));
    Ok(())
}

fn file_flow(ctx: &AppContext, project_id: i64) -> FileAnalysisFlow {
    FileAnalysisFlow::new(project_id, ctx.data.clone(), ctx.config.upload.clone())
        .with_stage_callback(Arc::new(render::stage))
}

/// Turns a flow outcome into output: `None` after a Ctrl-C, the flow's
/// user-facing message on failure.
fn finish<T>(flow: &FileAnalysisFlow, outcome: tabula_core::Result<T>) -> Result<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(TabulaError::Cancelled) => {
            println!("{}", "Cancelled".yellow());
            Ok(None)
        }
        Err(err) => {
            let message = flow.state().error().map(str::to_string);
            Err(anyhow::anyhow!(message.unwrap_or_else(|| err.to_string())))
        }
    }
}
