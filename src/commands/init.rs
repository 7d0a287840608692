//! `weft init`: start a project in this working copy

use anyhow::{Context as _, Result};
use colored::Colorize;

use super::common::{current_branch, print_done, Context};
use crate::engine;
use crate::fs::WorkDir;
use crate::models::ProjectType;

pub fn execute(
    project_type: ProjectType,
    name: String,
    branch: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let work_dir = WorkDir::discover(&cwd).unwrap_or_else(|| WorkDir::new(&cwd));
    work_dir.ensure()?;

    let ctx = Context::for_work_dir(work_dir)?;
    let _lock = ctx.lock()?;

    let branch = branch
        .or_else(|| current_branch(&ctx.repo_root()))
        .unwrap_or_else(|| "main".to_string());
    let workflow = engine::create(
        ctx.store(),
        project_type,
        &name,
        &branch,
        description.as_deref().unwrap_or(""),
    )?;

    print_done(&format!(
        "Created {} project {} on {}",
        project_type,
        name.bold(),
        branch.cyan()
    ));
    println!("  {} {}", "State:".dimmed(), workflow.state_label());
    println!("\n{}\n  {}", "Next".bold(), workflow.guidance());
    Ok(())
}
