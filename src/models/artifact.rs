use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::metadata::Metadata;

/// Approval state of an artifact.
///
/// Persisted as the optional `approved` field: absent means the artifact never
/// needs approval, `false` means approval is pending, `true` means approved.
/// Approval only ever moves towards `Approved`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Approval {
    #[default]
    NotRequired,
    Pending,
    Approved,
}

impl Approval {
    pub fn is_not_required(&self) -> bool {
        *self == Approval::NotRequired
    }

    pub fn is_pending(&self) -> bool {
        *self == Approval::Pending
    }

    pub fn is_approved(&self) -> bool {
        *self == Approval::Approved
    }
}

impl std::fmt::Display for Approval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Approval::NotRequired => write!(f, "-"),
            Approval::Pending => write!(f, "pending"),
            Approval::Approved => write!(f, "approved"),
        }
    }
}

impl Serialize for Approval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Approval::NotRequired => serializer.serialize_none(),
            Approval::Pending => serializer.serialize_bool(false),
            Approval::Approved => serializer.serialize_bool(true),
        }
    }
}

impl<'de> Deserialize<'de> for Approval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<bool>::deserialize(deserializer)? {
            None => Approval::NotRequired,
            Some(false) => Approval::Pending,
            Some(true) => Approval::Approved,
        })
    }
}

/// Whether an artifact informs a phase or is produced by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Input,
    Output,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Input => write!(f, "input"),
            ArtifactKind::Output => write!(f, "output"),
        }
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = crate::errors::WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "input" => Ok(ArtifactKind::Input),
            "output" => Ok(ArtifactKind::Output),
            _ => Err(crate::errors::WorkflowError::validation(format!(
                "unknown artifact kind '{s}'. Expected 'input' or 'output'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Approval::is_not_required")]
    pub approved: Approval,
    /// Task whose completion approves this artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Artifact {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: None,
            approved: Approval::NotRequired,
            task_id: None,
            created_at: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn requiring_approval(mut self) -> Self {
        self.approved = Approval::Pending;
        self
    }

    pub fn linked_to(mut self, task_id: Option<String>) -> Self {
        self.task_id = task_id;
        self
    }

    /// Flip to approved. Returns `false` if it already was.
    pub fn approve(&mut self) -> bool {
        if self.approved.is_approved() {
            return false;
        }
        self.approved = Approval::Approved;
        true
    }
}
