//! Structural validation of the state document
//!
//! Every document is checked before it is written and after it is read, so a
//! hand-edited or corrupted file is reported instead of driving the machine
//! from an impossible state.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;

use crate::kinds;
use crate::models::{Phase, Project};
use crate::validation::{validate_id, validate_project_name};

pub trait SchemaValidator {
    /// Accept or reject a serialized project document.
    fn validate(&self, document: &[u8]) -> Result<()>;
}

/// Schema of the YAML project document for all project types.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectSchema;

impl SchemaValidator for ProjectSchema {
    fn validate(&self, document: &[u8]) -> Result<()> {
        let project: Project =
            serde_yaml::from_slice(document).context("state document is not a valid project")?;

        let problems = check_project(&project);
        if !problems.is_empty() {
            bail!(
                "state document failed validation:\n  - {}",
                problems.join("\n  - ")
            );
        }
        Ok(())
    }
}

/// Every structural problem of `project`, in document order.
pub fn check_project(project: &Project) -> Vec<String> {
    let mut problems = Vec::new();

    if let Err(e) = validate_project_name(&project.name) {
        problems.push(e.to_string());
    }
    if project.branch.trim().is_empty() {
        problems.push("branch cannot be empty".to_string());
    }

    let states = kinds::state_labels(project.project_type);
    if !states.contains(&project.state) {
        problems.push(format!(
            "state '{}' is not a {} state",
            project.state, project.project_type
        ));
    }

    let specs = kinds::phase_specs(project.project_type);
    for spec in specs {
        match project.phases.get(spec.name) {
            None => problems.push(format!("missing phase '{}'", spec.name)),
            Some(phase) => {
                if !spec.optional && !phase.enabled {
                    problems.push(format!("phase '{}' is required but disabled", spec.name));
                }
                check_phase(spec.name, phase, &mut problems);
            }
        }
    }
    for name in project.phases.keys() {
        if !specs.iter().any(|s| s.name == name.as_str()) {
            problems.push(format!(
                "unknown phase '{name}' for a {} project",
                project.project_type
            ));
        }
    }

    for (role, session) in &project.agent_sessions {
        if let Err(e) = validate_id(role) {
            problems.push(format!("agent session role: {e}"));
        }
        if session.trim().is_empty() {
            problems.push(format!("agent session for '{role}' is empty"));
        }
    }

    problems
}

fn check_phase(name: &str, phase: &Phase, problems: &mut Vec<String>) {
    if phase.status.trim().is_empty() {
        problems.push(format!("{name}: status cannot be empty"));
    }

    let mut ids = HashSet::new();
    for task in &phase.tasks {
        if let Err(e) = validate_id(&task.id) {
            problems.push(format!("{name}: task {e}"));
        }
        if !ids.insert(task.id.as_str()) {
            problems.push(format!("{name}: duplicate task '{}'", task.id));
        }
        if task.session_id.as_deref().is_some_and(|s| s.trim().is_empty()) {
            problems.push(format!("{name}: task '{}' has an empty session", task.id));
        }
    }
    for task in &phase.tasks {
        for dep in &task.dependencies {
            if !ids.contains(dep.as_str()) {
                problems.push(format!(
                    "{name}: task '{}' depends on unknown task '{dep}'",
                    task.id
                ));
            }
        }
    }

    for artifact in phase.inputs.iter().chain(&phase.outputs) {
        if artifact.path.trim().is_empty() {
            problems.push(format!("{name}: artifact path cannot be empty"));
        }
        if let Some(task_id) = &artifact.task_id {
            if !ids.contains(task_id.as_str()) {
                problems.push(format!(
                    "{name}: artifact '{}' is linked to unknown task '{task_id}'",
                    artifact.path
                ));
            }
        }
    }
    for input in &phase.inputs {
        if !input.approved.is_not_required() {
            problems.push(format!(
                "{name}: input '{}' cannot carry an approval flag",
                input.path
            ));
        }
    }
}
