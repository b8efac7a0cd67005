use anyhow::Result;
use colored::Colorize;
use tabula_application::ProjectFlow;
use tabula_application::flows::create_project;
use tabula_core::auth::Route;
use tabula_core::project::ProjectDraft;

use crate::context::AppContext;
use crate::render;

pub async fn list(ctx: &AppContext) -> Result<()> {
    ctx.require(Route::Projects).await?;

    let projects = ctx.data.projects().await?;
    if projects.is_empty() {
        println!("{}", "No projects yet. Create one with `tabula projects create <NAME>`.".dimmed());
        return Ok(());
    }
    for project in &projects {
        render::project(project);
    }
    Ok(())
}

pub async fn create(ctx: &AppContext, name: String, description: Option<String>) -> Result<()> {
    ctx.require(Route::Projects).await?;

    let draft = ProjectDraft { name, description };
    let project = create_project(&ctx.data, &draft).await?;
    render::success(&format!("Created project {} ({})", project.name.bold(), project.id));
    Ok(())
}

pub async fn show(ctx: &AppContext, project_id: i64) -> Result<()> {
    ctx.require(Route::Project(project_id)).await?;

    let flow = ProjectFlow::new(project_id, ctx.data.clone(), ctx.config.upload.clone())?;
    let detail = flow.load().await?;

    render::project(&detail.project);
    println!();
    if detail.files.is_empty() {
        println!("{}", "No files. Add one with `tabula files upload`.".dimmed());
    }
    for file in &detail.files {
        render::file(file);
    }

    let relationships = ctx.data.relationships(project_id).await?;
    if !relationships.is_empty() {
        println!("\n{}", "Relationships".bold().underline());
        for rel in &relationships {
            println!(
                "  {} ⋈ {} on {} ({})",
                rel.file_a_id,
                rel.file_b_id,
                rel.join_key.cyan(),
                rel.join_type
            );
        }
    }
    Ok(())
}

pub async fn update(
    ctx: &AppContext,
    project_id: i64,
    name: String,
    description: Option<String>,
) -> Result<()> {
    ctx.require(Route::Project(project_id)).await?;

    let flow = ProjectFlow::new(project_id, ctx.data.clone(), ctx.config.upload.clone())?;
    let project = flow.update(&ProjectDraft { name, description }).await?;
    render::success(&format!("Updated project {}", project.name.bold()));
    Ok(())
}

pub async fn delete(ctx: &AppContext, project_id: i64) -> Result<()> {
    ctx.require(Route::Project(project_id)).await?;

    let flow = ProjectFlow::new(project_id, ctx.data.clone(), ctx.config.upload.clone())?;
    flow.delete().await?;
    render::success(&format!("Deleted project {}", project_id));
    Ok(())
}
