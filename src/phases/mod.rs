//! Phase operations
//!
//! A phase is the only code that knows which event corresponds to "this
//! operation satisfied the exit criteria of the current state". Operations
//! validate, mutate the project they are handed, and return the event the
//! caller should fire (if any). Validation always completes before the first
//! write so a failing operation leaves the project untouched.

pub mod finalization;
pub mod guards;

#[cfg(test)]
mod tests;

use crate::errors::{WorkflowError, WorkflowResult};
use crate::models::{Artifact, ArtifactKind, Project, Task, TaskStatus};
use crate::tracker::IssueDraft;

/// Outcome of a phase operation: an optional event for the caller to fire.
pub type OpResult<E> = WorkflowResult<Option<E>>;

pub trait PhaseOperations {
    type Event;

    /// Name of the phase in `Project::phases`.
    fn name(&self) -> &'static str;

    /// Check the phase's exit criteria and, if met, mark it done and return
    /// the completion event.
    fn complete(&self, project: &mut Project) -> OpResult<Self::Event>;

    /// Intra-phase progression. Phases without internal states answer with
    /// `Unsupported`.
    fn advance(&self, _project: &mut Project) -> OpResult<Self::Event> {
        Err(WorkflowError::Unsupported(format!(
            "the {} phase has no internal states to advance",
            self.name()
        )))
    }

    /// Generic metadata write. Phases may treat specific fields as workflow
    /// signals and return an event.
    fn set(&self, project: &mut Project, field: &str, value: &str) -> OpResult<Self::Event> {
        project
            .phase_mut(self.name())?
            .metadata
            .set_parsed(field, value);
        Ok(None)
    }

    fn add_task(&self, project: &mut Project, task: Task) -> OpResult<Self::Event> {
        project.phase_mut(self.name())?.add_task(task)?;
        Ok(None)
    }

    /// Update a task's status; completing a task approves its linked outputs.
    fn set_task_status(
        &self,
        project: &mut Project,
        task_id: &str,
        status: TaskStatus,
    ) -> OpResult<Self::Event> {
        update_task_status(project, self.name(), task_id, status)?;
        Ok(None)
    }

    fn add_artifact(
        &self,
        project: &mut Project,
        artifact: Artifact,
        kind: ArtifactKind,
    ) -> OpResult<Self::Event> {
        project.phase_mut(self.name())?.add_artifact(artifact, kind)?;
        Ok(None)
    }

    fn approve_artifact(&self, project: &mut Project, path: &str) -> OpResult<Self::Event> {
        project.phase_mut(self.name())?.approve_output(path)?;
        Ok(None)
    }

    /// Completed tasks in the order their issues must be created.
    fn publish_order(&self, _project: &Project) -> WorkflowResult<Vec<String>> {
        Err(WorkflowError::Unsupported(format!(
            "the {} phase does not publish work units",
            self.name()
        )))
    }

    fn issue_draft(&self, _project: &Project, _task_id: &str) -> WorkflowResult<IssueDraft> {
        Err(WorkflowError::Unsupported(format!(
            "the {} phase does not publish work units",
            self.name()
        )))
    }

    /// Store a created issue on its task; returns the completion event once
    /// every work unit is published.
    fn record_issue(
        &self,
        _project: &mut Project,
        _task_id: &str,
        _number: u64,
        _url: &str,
    ) -> OpResult<Self::Event> {
        Err(WorkflowError::Unsupported(format!(
            "the {} phase does not publish work units",
            self.name()
        )))
    }
}

/// Reject a second `complete` of the same phase.
pub fn ensure_not_completed(project: &Project, phase: &str) -> WorkflowResult<()> {
    if project.phase(phase)?.is(crate::models::phase::status::COMPLETED) {
        return Err(WorkflowError::validation(format!(
            "the {phase} phase is already completed"
        )));
    }
    Ok(())
}

/// Turn a guard-style check into a validation error for `action`.
pub fn require(check: Result<(), String>, action: &str) -> WorkflowResult<()> {
    check.map_err(|reason| WorkflowError::validation(format!("cannot {action}: {reason}")))
}

pub(crate) fn update_task_status(
    project: &mut Project,
    phase_name: &str,
    task_id: &str,
    status: TaskStatus,
) -> WorkflowResult<()> {
    let phase = project.phase_mut(phase_name)?;
    let task = phase.task_mut(task_id).ok_or_else(|| {
        WorkflowError::validation(format!("no task '{task_id}' in the {phase_name} phase"))
    })?;
    task.set_status(status);
    if status == TaskStatus::Completed {
        let approved = phase.auto_approve_for_task(task_id);
        if approved > 0 {
            tracing::info!(task = task_id, approved, "auto-approved linked artifacts");
        }
    }
    Ok(())
}
