use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::artifact::{Approval, Artifact, ArtifactKind};
use super::metadata::Metadata;
use super::task::{Task, TaskStatus};
use crate::errors::{WorkflowError, WorkflowResult};

/// Status values shared by every project type. Types add their own
/// intra-phase values (e.g. `summarizing`) on top of these.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const ACTIVE: &str = "active";
    pub const COMPLETED: &str = "completed";
    pub const SKIPPED: &str = "skipped";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub status: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub inputs: Vec<Artifact>,
    #[serde(default)]
    pub outputs: Vec<Artifact>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

fn default_enabled() -> bool {
    true
}

impl Phase {
    pub fn new(enabled: bool) -> Self {
        Self {
            status: status::PENDING.to_string(),
            enabled,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            tasks: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn is(&self, status: &str) -> bool {
        self.status == status
    }

    pub fn start(&mut self) {
        self.status = status::ACTIVE.to_string();
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
    }

    pub fn finish(&mut self) {
        self.status = status::COMPLETED.to_string();
        self.completed_at = Some(Utc::now());
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn unresolved_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| !t.status.is_resolved())
            .collect()
    }

    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// Append a task after checking its ID is unique and every dependency
    /// names an existing task of this phase.
    pub fn add_task(&mut self, task: Task) -> WorkflowResult<()> {
        if self.task(&task.id).is_some() {
            return Err(WorkflowError::validation(format!(
                "task '{}' already exists",
                task.id
            )));
        }
        for dep in &task.dependencies {
            if self.task(dep).is_none() {
                return Err(WorkflowError::MissingDependency {
                    task: task.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn artifacts(&self, kind: ArtifactKind) -> &[Artifact] {
        match kind {
            ArtifactKind::Input => &self.inputs,
            ArtifactKind::Output => &self.outputs,
        }
    }

    /// Record an artifact. Inputs never require approval.
    pub fn add_artifact(&mut self, mut artifact: Artifact, kind: ArtifactKind) -> WorkflowResult<()> {
        if self.artifacts(kind).iter().any(|a| a.path == artifact.path) {
            return Err(WorkflowError::validation(format!(
                "{kind} artifact '{}' is already tracked",
                artifact.path
            )));
        }
        if let Some(task_id) = &artifact.task_id {
            if self.task(task_id).is_none() {
                return Err(WorkflowError::validation(format!(
                    "artifact '{}' is linked to unknown task '{task_id}'",
                    artifact.path
                )));
            }
        }
        match kind {
            ArtifactKind::Input => {
                artifact.approved = Approval::NotRequired;
                self.inputs.push(artifact);
            }
            ArtifactKind::Output => self.outputs.push(artifact),
        }
        Ok(())
    }

    pub fn output(&self, path: &str) -> Option<&Artifact> {
        self.outputs.iter().find(|a| a.path == path)
    }

    pub fn approve_output(&mut self, path: &str) -> WorkflowResult<()> {
        let artifact = self
            .outputs
            .iter_mut()
            .find(|a| a.path == path)
            .ok_or_else(|| WorkflowError::validation(format!("no output artifact '{path}'")))?;
        if !artifact.approve() {
            return Err(WorkflowError::validation(format!(
                "artifact '{path}' is already approved"
            )));
        }
        Ok(())
    }

    /// Approve every pending output linked to `task_id`. Returns how many
    /// were approved.
    pub fn auto_approve_for_task(&mut self, task_id: &str) -> usize {
        self.outputs
            .iter_mut()
            .filter(|a| a.task_id.as_deref() == Some(task_id) && a.approved.is_pending())
            .map(|a| a.approve())
            .filter(|approved| *approved)
            .count()
    }

    pub fn pending_outputs(&self) -> Vec<&Artifact> {
        self.outputs
            .iter()
            .filter(|a| a.approved.is_pending())
            .collect()
    }

    pub fn approved_outputs(&self) -> Vec<&Artifact> {
        self.outputs
            .iter()
            .filter(|a| a.approved.is_approved())
            .collect()
    }
}
