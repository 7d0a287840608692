use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::artifact::Artifact;
use super::metadata::Metadata;
use crate::errors::{WorkflowError, WorkflowResult};

/// Gap between generated task IDs, leaving room to insert tasks later.
pub const TASK_ID_GAP: u32 = 10;

/// Status of a task within a phase.
///
/// Tasks normally move forward (`pending` -> `in_progress` -> `needs_review`
/// -> `completed`), with `abandoned` reachable from anywhere. `completed` and
/// `abandoned` are the resolved statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    NeedsReview,
    Completed,
    Abandoned,
}

impl TaskStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Abandoned)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::NeedsReview => write!(f, "needs_review"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "needs_review" => Ok(TaskStatus::NeedsReview),
            "completed" => Ok(TaskStatus::Completed),
            "abandoned" => Ok(TaskStatus::Abandoned),
            _ => Err(WorkflowError::validation(format!(
                "unknown task status '{s}'. Expected one of: pending, in_progress, needs_review, completed, abandoned"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Declarative hint that this task may be worked alongside others.
    #[serde(default)]
    pub parallel: bool,
    /// IDs of tasks in the same phase that must be done first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<Artifact>,
    /// Agent session working this task, recorded before the agent starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            parallel: false,
            dependencies: Vec::new(),
            refs: Vec::new(),
            session_id: None,
            created_at: now,
            updated_at: now,
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn add_dependency(&mut self, task_id: String) {
        if !self.dependencies.contains(&task_id) {
            self.dependencies.push(task_id);
            self.updated_at = Utc::now();
        }
    }
}

/// Next gap-numbered ID after the highest numeric ID present (`010`, `020`, ...).
///
/// Non-numeric IDs are ignored when looking for the maximum. Fails when the
/// next ID would not fit in a `u32`.
pub fn next_task_id(tasks: &[Task]) -> WorkflowResult<String> {
    let highest = tasks
        .iter()
        .filter_map(|t| t.id.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    let next = (highest / TASK_ID_GAP + 1)
        .checked_mul(TASK_ID_GAP)
        .ok_or_else(|| {
            WorkflowError::validation(format!(
                "no task ID left after '{highest}'. Pass an explicit ID"
            ))
        })?;
    Ok(format!("{next:03}"))
}
