//! `weft agent`: spawn and resume agent sessions
//!
//! The session ID is resolved and persisted under the workspace lock, and
//! the lock is dropped before the agent runs so other commands (including
//! the agent's own `weft` calls) are not blocked for the session's lifetime.

use anyhow::{Context as _, Result};
use colored::Colorize;

use super::common::{print_done, Context};
use crate::agents::{ExecutorRegistry, SessionKey, SessionManager};

const DEFAULT_RESUME_PROMPT: &str = "Continue where you left off.";

pub fn list() -> Result<()> {
    let ctx = Context::discover()?;
    let registry = ctx.agent_registry();

    println!("{}", "Roles".bold());
    println!("{}", "─".repeat(40).dimmed());
    for role in registry.roles() {
        println!("  {:<14} {}", role.name.bold(), role.description);
    }

    let executors = ExecutorRegistry::from_config(&ctx.config.executor, &ctx.repo_root())?;
    println!("\n{}", "Executors".bold());
    println!("{}", "─".repeat(40).dimmed());
    for name in executors.names() {
        let default = if name == ctx.config.executor.default {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {name}{default}");
    }

    let Ok(workflow) = ctx.open() else {
        return Ok(());
    };
    let project = workflow.project();
    let task_sessions: Vec<_> = project
        .phases
        .iter()
        .flat_map(|(phase, data)| data.tasks.iter().map(move |t| (phase, t)))
        .filter_map(|(phase, t)| t.session_id.as_ref().map(|s| (phase, &t.id, s)))
        .collect();
    if project.agent_sessions.is_empty() && task_sessions.is_empty() {
        return Ok(());
    }
    println!("\n{}", "Sessions".bold());
    println!("{}", "─".repeat(40).dimmed());
    for (role, session) in &project.agent_sessions {
        println!("  role {:<9} {}", role, session.dimmed());
    }
    for (phase, task, session) in task_sessions {
        println!("  task {:<9} {} {}", task, session.dimmed(), format!("({phase})").dimmed());
    }
    Ok(())
}

fn session_key(role: &str, task: Option<String>) -> SessionKey {
    match task {
        Some(id) => SessionKey::Task(id),
        None => SessionKey::Role(role.to_string()),
    }
}

pub fn spawn(role: Option<String>, task: Option<String>, executor: Option<String>) -> Result<()> {
    let ctx = Context::discover()?;
    let roles = ctx.agent_registry();
    let executors = ExecutorRegistry::from_config(&ctx.config.executor, &ctx.repo_root())?;
    let manager = SessionManager::new(executors.get(executor.as_deref())?);

    let (role, prompt, session_id) = {
        let _lock = ctx.lock()?;
        let mut workflow = ctx.open()?;

        let role = role
            .or_else(|| workflow.suggested_role().map(str::to_string))
            .context("No agent role suits the current state. Pass --role")?;
        let task_data = match &task {
            Some(id) => Some(
                workflow
                    .project()
                    .find_task(id)
                    .map(|(_, t)| t.clone())
                    .with_context(|| format!("No task '{id}' in this project"))?,
            ),
            None => None,
        };
        let prompt = roles.prompt_for(
            &role,
            &workflow.project().name,
            &workflow.guidance(),
            task_data.as_ref(),
        )?;

        let key = session_key(&role, task);
        let session_id = manager.prepare(workflow.ledger(), &key)?;
        print_done(&format!("Session {} recorded for {key}", session_id.bold()));
        (role, prompt, session_id)
    };

    manager.launch(&role, &prompt, &session_id)?;
    print_done(&format!("{role} agent exited"));
    Ok(())
}

pub fn resume(
    role: Option<String>,
    task: Option<String>,
    prompt: Option<String>,
    executor: Option<String>,
) -> Result<()> {
    let ctx = Context::discover()?;
    let executors = ExecutorRegistry::from_config(&ctx.config.executor, &ctx.repo_root())?;
    let manager = SessionManager::new(executors.get(executor.as_deref())?);

    let session_id = {
        let _lock = ctx.lock()?;
        let workflow = ctx.open()?;
        let key = match task {
            Some(id) => SessionKey::Task(id),
            None => SessionKey::Role(
                role.or_else(|| workflow.suggested_role().map(str::to_string))
                    .context("No agent role suits the current state. Pass --role or --task")?,
            ),
        };
        manager.resumable_session(workflow.ledger_ref(), &key)?
    };

    println!("{} Resuming session {}", "→".cyan().bold(), session_id.bold());
    manager.resume_recorded(&session_id, prompt.as_deref().unwrap_or(DEFAULT_RESUME_PROMPT))?;
    Ok(())
}
