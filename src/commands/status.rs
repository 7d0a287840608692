//! `weft status` and `weft events`

use anyhow::Result;
use colored::Colorize;

use super::common::Context;
use crate::models::phase::status;
use crate::models::{Phase, TaskStatus};

fn phase_status(phase: &Phase) -> colored::ColoredString {
    match phase.status.as_str() {
        status::COMPLETED => phase.status.green(),
        status::SKIPPED => phase.status.dimmed(),
        status::PENDING => phase.status.normal(),
        _ => phase.status.yellow().bold(),
    }
}

pub(super) fn task_marker(status: TaskStatus) -> colored::ColoredString {
    match status {
        TaskStatus::Completed => "✓".green(),
        TaskStatus::Abandoned => "✗".dimmed(),
        TaskStatus::InProgress => "●".yellow(),
        TaskStatus::NeedsReview => "?".cyan(),
        TaskStatus::Pending => "○".normal(),
    }
}

pub fn execute() -> Result<()> {
    let ctx = Context::discover()?;
    let workflow = ctx.open()?;
    let project = workflow.project();
    let active = workflow.active_phase();

    println!(
        "{} {}",
        project.name.bold(),
        format!("({} project on {})", project.project_type, project.branch).dimmed()
    );
    if !project.description.is_empty() {
        println!("  {}", project.description);
    }
    println!("  {} {}", "State:".dimmed(), workflow.state_label().cyan());

    println!("\n{}", "Phases".bold());
    println!("{}", "─".repeat(40).dimmed());
    for (name, phase) in &project.phases {
        let marker = if name == active { "▸" } else { " " };
        println!("{marker} {name:<16} {}", phase_status(phase));
    }

    let phase = project.phase(active)?;
    if !phase.tasks.is_empty() {
        println!("\n{} {}", "Tasks".bold(), format!("({active})").dimmed());
        println!("{}", "─".repeat(40).dimmed());
        for task in &phase.tasks {
            println!("  {} {} {}", task_marker(task.status), task.id.dimmed(), task.name);
        }
    }

    let pending = phase.pending_outputs();
    if !pending.is_empty() {
        println!("\n{}", "Awaiting approval".bold());
        for artifact in pending {
            println!("  {} {}", "•".yellow(), artifact.path);
        }
    }

    println!("\n{}\n  {}", "Next".bold(), workflow.guidance());
    if let Some(role) = workflow.suggested_role() {
        println!(
            "  {}",
            format!("Suggested agent: weft agent spawn --role {role}").dimmed()
        );
    }
    Ok(())
}

/// Events registered from the current state and whether each could fire now.
pub fn events() -> Result<()> {
    let ctx = Context::discover()?;
    let workflow = ctx.open()?;

    println!("{} {}", "State:".dimmed(), workflow.state_label().cyan());
    let candidates = workflow.candidate_events();
    if candidates.is_empty() {
        println!("  (terminal state: no events)");
        return Ok(());
    }
    for (event, verdict) in candidates {
        match verdict {
            Ok(()) => println!("  {} {event}", "✓".green().bold()),
            Err(reason) => println!("  {} {event} {}", "✗".red(), format!("({reason})").dimmed()),
        }
    }
    Ok(())
}
