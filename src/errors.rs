//! Error taxonomy for the workflow engine
//!
//! Every failure the core can report is a variant of [`WorkflowError`].
//! All of them are non-fatal: the persisted project is left untouched and the
//! caller may retry once the reported condition is fixed. Capability errors
//! (`Unsupported`, `ResumptionUnsupported`) are the exception in that retrying
//! with different arguments cannot help.

use thiserror::Error;

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No transition is registered for the current state and event.
    #[error("illegal transition: event '{event}' is not allowed from state '{state}'")]
    IllegalTransition { state: String, event: String },

    /// A transition exists but its guard refused it.
    #[error("cannot fire '{event}' from '{state}': {reason}")]
    GuardRejected {
        state: String,
        event: String,
        reason: String,
    },

    /// Two transitions share the same source state and event.
    #[error("ambiguous transition: '{event}' from '{state}' is registered more than once")]
    AmbiguousTransition { state: String, event: String },

    /// A phase-specific precondition failed.
    #[error("{0}")]
    Validation(String),

    /// The phase or backend does not implement the requested operation.
    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("no session found for '{0}' - spawn first")]
    NoSession(String),

    #[error("executor '{0}' does not support session resumption")]
    ResumptionUnsupported(String),

    #[error("metadata field '{key}' is {found}, expected {expected}")]
    MetadataType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("circular dependency detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("task '{task}' depends on '{dependency}', which is missing or not resolved")]
    MissingDependency { task: String, dependency: String },

    #[error("no active project. Run 'weft init' first.")]
    NoProject,

    #[error("project '{0}' already exists in this working copy")]
    ProjectExists(String),

    /// A collaborator (document store, schema validator, issue tracker,
    /// agent executor) failed.
    #[error("{operation} failed: {message}")]
    External { operation: String, message: String },
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    /// Wrap a collaborator failure, keeping the whole context chain.
    pub fn external(operation: impl Into<String>, err: anyhow::Error) -> Self {
        WorkflowError::External {
            operation: operation.into(),
            message: format!("{err:#}"),
        }
    }

    /// Whether correcting the reported condition and retrying can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            WorkflowError::Unsupported(_)
                | WorkflowError::ResumptionUnsupported(_)
                | WorkflowError::AmbiguousTransition { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_joins_path() {
        let err = WorkflowError::Cycle(vec!["001".into(), "002".into(), "001".into()]);
        assert_eq!(
            err.to_string(),
            "circular dependency detected: 001 -> 002 -> 001"
        );
    }

    #[test]
    fn test_external_keeps_context_chain() {
        let inner = anyhow::anyhow!("disk full").context("Failed to write state.yaml");
        let err = WorkflowError::external("save project", inner);
        assert_eq!(
            err.to_string(),
            "save project failed: Failed to write state.yaml: disk full"
        );
    }

    #[test]
    fn test_capability_errors_are_not_retryable() {
        assert!(!WorkflowError::Unsupported("advance".into()).is_retryable());
        assert!(!WorkflowError::ResumptionUnsupported("command".into()).is_retryable());
        assert!(WorkflowError::validation("1 task unresolved").is_retryable());
        assert!(WorkflowError::NoSession("020".into()).is_retryable());
    }
}
