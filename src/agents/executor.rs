//! Agent execution backends
//!
//! Spawning is blocking: the calling command waits for the agent process to
//! exit. There is no timeout; a stuck agent stalls the command until it is
//! interrupted.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::config::ExecutorConfig;
use crate::errors::{WorkflowError, WorkflowResult};

/// Backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorKind {
    /// Claude Code CLI, resumable by session ID
    #[default]
    Claude,
    /// Arbitrary shell command; cannot resume
    Command,
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorKind::Claude => write!(f, "claude"),
            ExecutorKind::Command => write!(f, "command"),
        }
    }
}

impl std::str::FromStr for ExecutorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(ExecutorKind::Claude),
            "command" => Ok(ExecutorKind::Command),
            _ => bail!("Unknown executor: {s}. Expected 'claude' or 'command'"),
        }
    }
}

pub trait AgentExecutor {
    fn name(&self) -> &str;

    /// Start a new session with a caller-chosen ID. Blocks until the agent
    /// process exits.
    fn spawn(&self, role: &str, prompt: &str, session_id: &str) -> Result<()>;

    /// Continue an existing session with a follow-up prompt.
    fn resume(&self, session_id: &str, prompt: &str) -> Result<()>;

    fn supports_resumption(&self) -> bool;
}

fn check_exit(program: &str, status: ExitStatus) -> Result<()> {
    if !status.success() {
        match status.code() {
            Some(code) => bail!("{program} exited with status {code}"),
            None => bail!("{program} was terminated by a signal"),
        }
    }
    Ok(())
}

/// Runs the `claude` CLI in the foreground.
#[derive(Debug, Clone)]
pub struct ClaudeExecutor {
    binary: String,
    working_dir: Option<PathBuf>,
}

impl ClaudeExecutor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn run(&self, args: &[&str], role: Option<&str>) -> Result<()> {
        if which::which(&self.binary).is_err() {
            bail!(
                "'{}' not found on PATH. Install Claude Code or set [executor] claude_binary",
                self.binary
            );
        }
        let mut command = Command::new(&self.binary);
        command.args(args);
        if let Some(role) = role {
            command.env("WEFT_ROLE", role);
        }
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        let status = command
            .status()
            .with_context(|| format!("Failed to execute: {}", self.binary))?;
        check_exit(&self.binary, status)
    }
}

impl AgentExecutor for ClaudeExecutor {
    fn name(&self) -> &str {
        "claude"
    }

    fn spawn(&self, role: &str, prompt: &str, session_id: &str) -> Result<()> {
        tracing::info!(role, session_id, "spawning claude session");
        self.run(&["--session-id", session_id, prompt], Some(role))
    }

    fn resume(&self, session_id: &str, prompt: &str) -> Result<()> {
        tracing::info!(session_id, "resuming claude session");
        self.run(&["--resume", session_id, prompt], None)
    }

    fn supports_resumption(&self) -> bool {
        true
    }
}

/// Runs a configured shell command with the prompt on stdin and the session
/// in `WEFT_SESSION_ID`.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    command: String,
    working_dir: Option<PathBuf>,
}

impl CommandExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl AgentExecutor for CommandExecutor {
    fn name(&self) -> &str {
        "command"
    }

    fn spawn(&self, role: &str, prompt: &str, session_id: &str) -> Result<()> {
        tracing::info!(role, session_id, command = %self.command, "spawning agent command");
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&self.command)
            .env("WEFT_SESSION_ID", session_id)
            .env("WEFT_ROLE", role)
            .stdin(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to execute: {}", self.command))?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("Failed to open stdin of: {}", self.command))?;
            // The command may exit without reading its input.
            if let Err(err) = stdin.write_all(prompt.as_bytes()) {
                if err.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(err).context("Failed to send prompt");
                }
            }
        }

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for: {}", self.command))?;
        check_exit(&self.command, status)
    }

    fn resume(&self, _session_id: &str, _prompt: &str) -> Result<()> {
        bail!("the command executor cannot resume sessions")
    }

    fn supports_resumption(&self) -> bool {
        false
    }
}

/// Create an executor from configuration
pub fn create_executor(
    kind: ExecutorKind,
    config: &ExecutorConfig,
    working_dir: &Path,
) -> Result<Box<dyn AgentExecutor>> {
    match kind {
        ExecutorKind::Claude => Ok(Box::new(
            ClaudeExecutor::new(config.claude_binary.clone()).in_dir(working_dir),
        )),
        ExecutorKind::Command => {
            let command = config
                .command
                .clone()
                .context("The command executor needs [executor] command in config.toml")?;
            Ok(Box::new(CommandExecutor::new(command).in_dir(working_dir)))
        }
    }
}

/// Executors available to this process, by name.
pub struct ExecutorRegistry {
    executors: BTreeMap<String, Box<dyn AgentExecutor>>,
    default: String,
}

impl ExecutorRegistry {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            executors: BTreeMap::new(),
            default: default.into(),
        }
    }

    /// `claude` is always registered; `command` only once configured.
    pub fn from_config(config: &ExecutorConfig, working_dir: &Path) -> Result<Self> {
        let mut registry = Self::new(config.default.clone());
        registry.register(create_executor(ExecutorKind::Claude, config, working_dir)?);
        if config.command.is_some() {
            registry.register(create_executor(ExecutorKind::Command, config, working_dir)?);
        }
        Ok(registry)
    }

    pub fn register(&mut self, executor: Box<dyn AgentExecutor>) {
        self.executors.insert(executor.name().to_string(), executor);
    }

    /// Look up `name`, or the configured default.
    pub fn get(&self, name: Option<&str>) -> WorkflowResult<&dyn AgentExecutor> {
        let name = name.unwrap_or(&self.default);
        self.executors
            .get(name)
            .map(|e| e.as_ref())
            .ok_or_else(|| {
                WorkflowError::validation(format!(
                    "executor '{name}' is not available. Available: {}",
                    self.names().join(", ")
                ))
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.executors.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.names())
            .field("default", &self.default)
            .finish()
    }
}
