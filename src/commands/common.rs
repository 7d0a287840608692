//! Shared setup for command handlers: work directory discovery, the lock,
//! and rendering of operation outcomes.

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;

use crate::agents::AgentRegistry;
use crate::config::Config;
use crate::engine::{self, AnyWorkflow, Outcome, ProjectSchema, ProjectStore};
use crate::fs::{FsDocumentStore, WorkDir, WorkspaceLock};

/// Everything a command needs to reach the active project.
pub struct Context {
    pub work_dir: WorkDir,
    pub config: Config,
}

impl Context {
    /// Find `.weft/` from the current directory and load configuration.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let work_dir = WorkDir::discover(&cwd)
            .context("No .weft directory found. Run 'weft init' first.")?;
        Self::for_work_dir(work_dir)
    }

    pub fn for_work_dir(work_dir: WorkDir) -> Result<Self> {
        let config = Config::load(&work_dir.config_path())?;
        Ok(Self { work_dir, config })
    }

    pub fn store(&self) -> ProjectStore {
        ProjectStore::for_work_dir(Rc::new(FsDocumentStore), Rc::new(ProjectSchema), &self.work_dir)
    }

    /// Exclusive lock for a load, mutate, persist window.
    pub fn lock(&self) -> Result<WorkspaceLock> {
        WorkspaceLock::acquire(&self.work_dir.lock_path())
    }

    pub fn open(&self) -> Result<Box<dyn AnyWorkflow>> {
        Ok(engine::open(self.store())?)
    }

    pub fn repo_root(&self) -> PathBuf {
        self.work_dir
            .repo_root()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Run `op` against the project while holding the workspace lock.
    pub fn with_workflow<T>(&self, op: impl FnOnce(&mut dyn AnyWorkflow) -> Result<T>) -> Result<T> {
        let _lock = self.lock()?;
        let mut workflow = self.open()?;
        op(workflow.as_mut())
    }

    pub fn agent_registry(&self) -> AgentRegistry {
        let mut registry = AgentRegistry::with_defaults();
        registry.extend_from_config(&self.config.agents);
        registry
    }
}

pub fn with_workflow<T>(op: impl FnOnce(&mut dyn AnyWorkflow) -> Result<T>) -> Result<T> {
    Context::discover()?.with_workflow(op)
}

/// Logging level from the repository configuration, if one is reachable.
/// Configuration errors are reported later by the command itself.
pub fn configured_log_level() -> Option<String> {
    let cwd = std::env::current_dir().ok()?;
    let work_dir = WorkDir::discover(cwd)?;
    Config::load(&work_dir.config_path()).ok()?.logging.level
}

/// Current git branch of `repo_root`, if it is a git checkout.
pub fn current_branch(repo_root: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(repo_root)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!branch.is_empty() && branch != "HEAD").then_some(branch)
}

pub fn print_done(message: &str) {
    println!("{} {message}", "✓".green().bold());
}

pub fn print_outcome(outcome: &Outcome) {
    if let Some(transition) = &outcome.transition {
        println!(
            "{} {} {} {} {}",
            "→".cyan().bold(),
            transition.from.dimmed(),
            "→".dimmed(),
            transition.to.bold(),
            format!("({})", transition.event).dimmed()
        );
    }
    if let Some(guidance) = outcome.guidance.as_deref().filter(|g| !g.is_empty()) {
        println!("\n{}\n  {guidance}", "Next".bold());
    }
    if outcome.finished {
        println!(
            "\n{} Project finished. {}",
            "✓".green().bold(),
            ".weft/project/ removed".dimmed()
        );
    }
}
