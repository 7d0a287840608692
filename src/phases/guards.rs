//! Pure predicates over project state
//!
//! Each check returns `Err(reason)` naming the unmet precondition. They back
//! both transition guards and the validation inside phase operations.

use crate::graph;
use crate::models::{phase::status, Project, TaskStatus};

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Every task resolved (completed or abandoned) and at least one completed.
pub fn tasks_resolved(project: &Project, phase: &str) -> Result<(), String> {
    let phase_data = project.phase(phase).map_err(|e| e.to_string())?;
    let unresolved = phase_data.unresolved_tasks();
    if !unresolved.is_empty() {
        let ids: Vec<&str> = unresolved.iter().map(|t| t.id.as_str()).collect();
        let verb = if unresolved.len() == 1 { "remains" } else { "remain" };
        return Err(format!(
            "{} {verb} ({})",
            plural(unresolved.len(), "unresolved task"),
            ids.join(", ")
        ));
    }
    if phase_data.count_with_status(TaskStatus::Completed) == 0 {
        return Err("no task has been completed".to_string());
    }
    Ok(())
}

pub fn has_tasks(project: &Project, phase: &str, min: usize) -> Result<(), String> {
    let count = project.phase(phase).map_err(|e| e.to_string())?.tasks.len();
    if count < min {
        return Err(format!(
            "{} of {} required exist",
            plural(count, "task"),
            min
        ));
    }
    Ok(())
}

pub fn has_inputs(project: &Project, phase: &str) -> Result<(), String> {
    if project
        .phase(phase)
        .map_err(|e| e.to_string())?
        .inputs
        .is_empty()
    {
        return Err(format!("the {phase} phase has no input artifacts yet"));
    }
    Ok(())
}

/// At least one approved output and none still waiting for approval.
pub fn outputs_approved(project: &Project, phase: &str) -> Result<(), String> {
    let phase_data = project.phase(phase).map_err(|e| e.to_string())?;
    no_pending_outputs(project, phase)?;
    if phase_data.approved_outputs().is_empty() {
        return Err(format!("the {phase} phase has no approved output yet"));
    }
    Ok(())
}

pub fn no_pending_outputs(project: &Project, phase: &str) -> Result<(), String> {
    let pending = project
        .phase(phase)
        .map_err(|e| e.to_string())?
        .pending_outputs();
    if !pending.is_empty() {
        let paths: Vec<&str> = pending.iter().map(|a| a.path.as_str()).collect();
        return Err(format!(
            "{} awaiting approval ({})",
            plural(pending.len(), "artifact"),
            paths.join(", ")
        ));
    }
    Ok(())
}

pub fn flag_set(project: &Project, phase: &str, key: &str) -> Result<(), String> {
    let set = project
        .phase(phase)
        .map_err(|e| e.to_string())?
        .metadata
        .flag(key)
        .map_err(|e| e.to_string())?;
    if !set {
        return Err(format!("'{key}' is not set on the {phase} phase"));
    }
    Ok(())
}

pub fn metadata_present(project: &Project, phase: &str, key: &str) -> Result<(), String> {
    let value = project
        .phase(phase)
        .map_err(|e| e.to_string())?
        .metadata
        .get_str(key)
        .map_err(|e| e.to_string())?;
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(format!("'{key}' is not set on the {phase} phase")),
    }
}

pub fn phase_enabled(project: &Project, phase: &str) -> Result<(), String> {
    if !project.phase(phase).map_err(|e| e.to_string())?.enabled {
        return Err(format!("the {phase} phase is skipped"));
    }
    Ok(())
}

pub fn phase_skipped(project: &Project, phase: &str) -> Result<(), String> {
    let data = project.phase(phase).map_err(|e| e.to_string())?;
    if data.enabled || !data.is(status::SKIPPED) {
        return Err(format!("the {phase} phase is enabled"));
    }
    Ok(())
}

/// Completed tasks form a valid, acyclic dependency graph.
pub fn dependencies_valid(project: &Project, phase: &str) -> Result<(), String> {
    let tasks = &project.phase(phase).map_err(|e| e.to_string())?.tasks;
    graph::publish_order(tasks)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
