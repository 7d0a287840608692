//! `weft task`: tasks of the active phase

use anyhow::{bail, Result};
use colored::Colorize;

use super::common::{print_done, print_outcome, with_workflow, Context};
use super::status::task_marker;
use crate::engine::NewTask;
use crate::models::TaskStatus;

pub fn add(
    name: String,
    id: Option<String>,
    description: Option<String>,
    dependencies: Vec<String>,
    parallel: bool,
) -> Result<()> {
    with_workflow(|wf| {
        let phase = wf.active_phase();
        let (id, outcome) = wf.add_task(NewTask {
            id,
            name: name.clone(),
            description: description.unwrap_or_default(),
            dependencies,
            parallel,
        })?;
        print_done(&format!("Added task {} to {phase}: {name}", id.bold()));
        print_outcome(&outcome);
        Ok(())
    })
}

pub fn status(id: String, status: TaskStatus) -> Result<()> {
    with_workflow(|wf| {
        let outcome = wf.set_task_status(&id, status)?;
        print_done(&format!("Task {} is now {status}", id.bold()));
        print_outcome(&outcome);
        Ok(())
    })
}

pub fn list(phase: Option<String>) -> Result<()> {
    let ctx = Context::discover()?;
    let workflow = ctx.open()?;
    let name = phase.as_deref().unwrap_or(workflow.active_phase());
    let data = workflow.project().phase(name)?;

    if data.tasks.is_empty() {
        println!("(no tasks in the {name} phase)");
        return Ok(());
    }
    println!("{} {}", "Tasks".bold(), format!("({name})").dimmed());
    println!("{}", "─".repeat(40).dimmed());
    for task in &data.tasks {
        let deps = if task.dependencies.is_empty() {
            String::new()
        } else {
            format!(" after {}", task.dependencies.join(", "))
        };
        let parallel = if task.parallel { " [parallel]" } else { "" };
        println!(
            "  {} {} {} {}",
            task_marker(task.status),
            task.id.dimmed(),
            task.name,
            format!("{}{deps}{parallel}", task.status).dimmed()
        );
    }
    Ok(())
}

pub fn show(id: String) -> Result<()> {
    let ctx = Context::discover()?;
    let workflow = ctx.open()?;
    let Some((phase, task)) = workflow.project().find_task(&id) else {
        bail!("No task '{id}' in this project");
    };

    println!("{} {}", task.id.bold(), task.name);
    println!("  {:<12} {phase}", "Phase:".dimmed());
    println!("  {:<12} {}", "Status:".dimmed(), task.status);
    if !task.dependencies.is_empty() {
        println!("  {:<12} {}", "Depends on:".dimmed(), task.dependencies.join(", "));
    }
    if task.parallel {
        println!("  {:<12} yes", "Parallel:".dimmed());
    }
    if let Some(session) = &task.session_id {
        println!("  {:<12} {session}", "Session:".dimmed());
    }
    for (key, value) in task.metadata.iter() {
        println!("  {:<12} {value}", format!("{key}:").dimmed());
    }
    if !task.description.is_empty() {
        println!("\n{}", task.description);
    }
    Ok(())
}
