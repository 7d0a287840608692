use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::phase::Phase;
use super::task::Task;
use crate::errors::{WorkflowError, WorkflowResult};

/// Selects the state vocabulary and phase set of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Standard,
    Exploration,
    Design,
    Breakdown,
}

impl ProjectType {
    pub const ALL: [ProjectType; 4] = [
        ProjectType::Standard,
        ProjectType::Exploration,
        ProjectType::Design,
        ProjectType::Breakdown,
    ];
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Standard => write!(f, "standard"),
            ProjectType::Exploration => write!(f, "exploration"),
            ProjectType::Design => write!(f, "design"),
            ProjectType::Breakdown => write!(f, "breakdown"),
        }
    }
}

impl std::str::FromStr for ProjectType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ProjectType::Standard),
            "exploration" => Ok(ProjectType::Exploration),
            "design" => Ok(ProjectType::Design),
            "breakdown" => Ok(ProjectType::Breakdown),
            _ => Err(WorkflowError::validation(format!(
                "unknown project type '{s}'. Expected standard, exploration, design or breakdown"
            ))),
        }
    }
}

/// The root aggregate: one per working copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub branch: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    /// Current state of the project type's machine.
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub phases: BTreeMap<String, Phase>,
    /// Sessions of taskless agent invocations, keyed by agent role.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub agent_sessions: BTreeMap<String, String>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        branch: impl Into<String>,
        description: impl Into<String>,
        project_type: ProjectType,
        state: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            branch: branch.into(),
            description: description.into(),
            project_type,
            state: state.into(),
            created_at: now,
            updated_at: now,
            phases: BTreeMap::new(),
            agent_sessions: BTreeMap::new(),
        }
    }

    pub fn phase(&self, name: &str) -> WorkflowResult<&Phase> {
        self.phases
            .get(name)
            .ok_or_else(|| WorkflowError::validation(format!("project has no '{name}' phase")))
    }

    pub fn phase_mut(&mut self, name: &str) -> WorkflowResult<&mut Phase> {
        self.phases
            .get_mut(name)
            .ok_or_else(|| WorkflowError::validation(format!("project has no '{name}' phase")))
    }

    /// Find a task by ID across all phases, returning its phase name too.
    pub fn find_task(&self, id: &str) -> Option<(&str, &Task)> {
        self.phases
            .iter()
            .find_map(|(name, phase)| phase.task(id).map(|t| (name.as_str(), t)))
    }

    pub fn find_task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.phases
            .values_mut()
            .find_map(|phase| phase.task_mut(id))
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
