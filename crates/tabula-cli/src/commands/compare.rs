//! Comparison and merge, driven through the same wizards a UI would step through.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tabula_application::ProjectFlow;
use tabula_core::auth::Route;
use tabula_core::compare::{ComparisonType, JoinType};
use tabula_core::project::{ProjectDetail, ProjectFile};
use tabula_core::wizard::{Navigation, Wizard};

use super::cancel_on_ctrl_c;
use crate::context::AppContext;
use crate::render;

pub async fn compare(
    ctx: &AppContext,
    project_id: i64,
    file_a: i64,
    file_b: i64,
    comparison_type: ComparisonType,
) -> Result<()> {
    ctx.require(Route::Compare(project_id)).await?;

    let flow = ProjectFlow::new(project_id, ctx.data.clone(), ctx.config.upload.clone())?;
    let detail = flow.load().await?;
    let (a, b) = (pick(&detail, file_a)?, pick(&detail, file_b)?);

    let wizard = flow.comparison_wizard();
    wizard
        .update_answers(|answers| {
            answers.files.file_a = Some(a.clone());
            answers.files.file_b = Some(b.clone());
            answers.comparison_type = Some(comparison_type);
        })
        .await;
    walk_to_review(wizard).await?;

    println!(
        "{} {} and {} ({})",
        "Comparing".bold(),
        a.filename.cyan(),
        b.filename.cyan(),
        comparison_type
    );
    let interrupt = cancel_on_ctrl_c(flow.cancellation_token());
    let outcome = flow.run_comparison().await;
    interrupt.abort();

    match outcome? {
        Some(result) => render::comparison(&result),
        None => bail!("The comparison is not ready to run"),
    }
    Ok(())
}

pub async fn merge(
    ctx: &AppContext,
    project_id: i64,
    file_a: i64,
    file_b: i64,
    join_key: String,
    join_type: JoinType,
    intent: Option<String>,
) -> Result<()> {
    ctx.require(Route::Merge(project_id)).await?;

    let flow = ProjectFlow::new(project_id, ctx.data.clone(), ctx.config.upload.clone())?;
    let detail = flow.load().await?;
    let (a, b) = (pick(&detail, file_a)?, pick(&detail, file_b)?);

    let wizard = flow.merge_wizard();
    wizard
        .update_answers(|answers| {
            answers.set_file_a(a.clone());
            answers.set_file_b(b.clone());
            answers.join_key = Some(join_key.clone());
            answers.join_type = join_type;
            answers.user_intent = intent.filter(|i| !i.trim().is_empty());
        })
        .await;

    let answers = wizard.answers().await;
    if !answers.has_valid_join_key() {
        let keys = answers.selectable_join_keys();
        if keys.is_empty() {
            bail!(
                "{} and {} share no columns, so they cannot be merged",
                a.filename,
                b.filename
            );
        }
        bail!(
            "'{}' is not in both files. Choose one of: {}",
            join_key,
            keys.join(", ")
        );
    }
    walk_to_review(wizard).await?;

    println!(
        "{} {} {} {} on {}",
        "Merging".bold(),
        a.filename.cyan(),
        format!("{} join", join_type).dimmed(),
        b.filename.cyan(),
        join_key.bold()
    );
    let interrupt = cancel_on_ctrl_c(flow.cancellation_token());
    let outcome = flow.run_merge().await;
    interrupt.abort();

    match outcome? {
        Some(result) => render::merge(&result),
        None => bail!("The merge is not ready to run"),
    }
    Ok(())
}

fn pick(detail: &ProjectDetail, file_id: i64) -> Result<ProjectFile> {
    detail
        .file(file_id)
        .cloned()
        .with_context(|| format!("Project {} has no file {}", detail.project.id, file_id))
}

/// Advances to the last step, naming the step that refused.
async fn walk_to_review<A>(wizard: &Wizard<A>) -> Result<()>
where
    A: Clone + Send + Sync + 'static,
{
    loop {
        match wizard.next().await {
            Navigation::Moved { to } => {
                tracing::debug!("wizard moved to step {}", to);
            }
            Navigation::AtBoundary => return Ok(()),
            Navigation::Blocked => {
                let step = wizard.current_step().await;
                bail!("Cannot continue past '{}'", step.title);
            }
        }
    }
}
