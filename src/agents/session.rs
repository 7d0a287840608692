//! Crash-safe agent sessions
//!
//! A session ID is generated and persisted *before* the agent process starts.
//! If this process dies while the agent runs, the next invocation finds the
//! recorded ID and resumes the same session instead of starting a duplicate.
//! Once recorded, an ID is never regenerated or rewritten.

use uuid::Uuid;

use super::executor::AgentExecutor;
use crate::errors::{WorkflowError, WorkflowResult};

/// Who owns a session: a task, or an agent role for taskless work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Task(String),
    Role(String),
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKey::Task(id) => write!(f, "task {id}"),
            SessionKey::Role(role) => write!(f, "role {role}"),
        }
    }
}

/// Durable record of session IDs.
pub trait SessionLedger {
    /// The recorded session for `key`. Fails if a task key names no task.
    fn session_for(&self, key: &SessionKey) -> WorkflowResult<Option<String>>;

    /// Record a new session and persist it before returning.
    fn record_session(&mut self, key: &SessionKey, session_id: &str) -> WorkflowResult<()>;
}

pub struct SessionManager<'a> {
    executor: &'a dyn AgentExecutor,
}

impl<'a> SessionManager<'a> {
    pub fn new(executor: &'a dyn AgentExecutor) -> Self {
        Self { executor }
    }

    /// Resolve the session for `key`, generating and persisting one if none
    /// is recorded yet.
    pub fn prepare(&self, ledger: &mut dyn SessionLedger, key: &SessionKey) -> WorkflowResult<String> {
        if let Some(existing) = ledger.session_for(key)? {
            tracing::info!(%key, session_id = %existing, "reusing recorded session");
            return Ok(existing);
        }
        let session_id = Uuid::new_v4().to_string();
        ledger.record_session(key, &session_id)?;
        tracing::info!(%key, %session_id, "session recorded");
        Ok(session_id)
    }

    /// Run the agent for a prepared session. Blocks until it exits.
    pub fn launch(&self, role: &str, prompt: &str, session_id: &str) -> WorkflowResult<()> {
        self.executor
            .spawn(role, prompt, session_id)
            .map_err(|e| WorkflowError::external(format!("spawn {role} agent"), e))
    }

    /// `prepare` then `launch`.
    pub fn spawn(
        &self,
        ledger: &mut dyn SessionLedger,
        key: &SessionKey,
        role: &str,
        prompt: &str,
    ) -> WorkflowResult<String> {
        let session_id = self.prepare(ledger, key)?;
        self.launch(role, prompt, &session_id)?;
        Ok(session_id)
    }

    /// The recorded session for `key`, after checking the executor can
    /// resume at all.
    pub fn resumable_session(
        &self,
        ledger: &dyn SessionLedger,
        key: &SessionKey,
    ) -> WorkflowResult<String> {
        if !self.executor.supports_resumption() {
            return Err(WorkflowError::ResumptionUnsupported(
                self.executor.name().to_string(),
            ));
        }
        let id = match key {
            SessionKey::Task(id) | SessionKey::Role(id) => id,
        };
        ledger
            .session_for(key)?
            .ok_or_else(|| WorkflowError::NoSession(id.clone()))
    }

    /// Continue the recorded session with a follow-up prompt. The stored ID
    /// is never modified.
    pub fn resume(
        &self,
        ledger: &dyn SessionLedger,
        key: &SessionKey,
        prompt: &str,
    ) -> WorkflowResult<String> {
        let session_id = self.resumable_session(ledger, key)?;
        self.resume_recorded(&session_id, prompt)?;
        Ok(session_id)
    }

    pub fn resume_recorded(&self, session_id: &str, prompt: &str) -> WorkflowResult<()> {
        tracing::info!(session_id, "resuming session");
        self.executor
            .resume(session_id, prompt)
            .map_err(|e| WorkflowError::external("resume agent", e))
    }
}
