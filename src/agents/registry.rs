use std::collections::BTreeMap;

use crate::config::AgentConfig;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::models::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRole {
    pub name: String,
    pub description: String,
    /// Standing instructions prepended to every prompt for this role.
    pub instructions: String,
}

impl AgentRole {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions: instructions.into(),
        }
    }
}

/// Roles known to this process. Built once at startup and passed down.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    roles: BTreeMap<String, AgentRole>,
}

const BUILTIN_ROLES: &[(&str, &str, &str)] = &[
    (
        "planner",
        "Turns a goal into a plan and a task list",
        "You plan work. Produce a plan document and break it into small, independently verifiable tasks with explicit dependencies.",
    ),
    (
        "implementer",
        "Implements a single task",
        "You implement exactly one task. Keep the change focused, run the tests, and report what changed.",
    ),
    (
        "reviewer",
        "Reviews completed work",
        "You review the implementation against the plan. Write a review report ending with a verdict of pass or fail.",
    ),
    (
        "researcher",
        "Investigates an open question",
        "You research one topic. Record sources and findings so they can be summarized later.",
    ),
    (
        "architect",
        "Drafts design documents",
        "You write design documents. State the problem, the options considered and the decision.",
    ),
    (
        "decomposer",
        "Splits a body of work into publishable units",
        "You decompose work into units that can each be delivered on their own. Name the dependencies between units.",
    ),
];

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in roles.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, description, instructions) in BUILTIN_ROLES {
            registry.register(AgentRole::new(*name, *description, *instructions));
        }
        registry
    }

    /// Add roles from configuration; fields left out keep the built-in value.
    pub fn extend_from_config(&mut self, agents: &BTreeMap<String, AgentConfig>) {
        for (name, config) in agents {
            let mut role = self
                .roles
                .get(name)
                .cloned()
                .unwrap_or_else(|| AgentRole::new(name.as_str(), "", ""));
            if let Some(description) = &config.description {
                role.description = description.clone();
            }
            if let Some(prompt) = &config.prompt {
                role.instructions = prompt.clone();
            }
            self.register(role);
        }
    }

    pub fn register(&mut self, role: AgentRole) {
        self.roles.insert(role.name.clone(), role);
    }

    pub fn get(&self, name: &str) -> WorkflowResult<&AgentRole> {
        self.roles.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.roles.keys().map(String::as_str).collect();
            WorkflowError::validation(format!(
                "unknown agent role '{name}'. Known roles: {}",
                known.join(", ")
            ))
        })
    }

    pub fn roles(&self) -> impl Iterator<Item = &AgentRole> {
        self.roles.values()
    }

    /// Prompt for a fresh session: role instructions, project guidance and
    /// the task being worked, if any.
    pub fn prompt_for(
        &self,
        role: &str,
        project: &str,
        guidance: &str,
        task: Option<&Task>,
    ) -> WorkflowResult<String> {
        let role = self.get(role)?;
        let mut prompt = format!(
            "{}\n\nProject: {project}\nCurrent step: {guidance}\n",
            role.instructions
        );
        if let Some(task) = task {
            prompt.push_str(&format!("\nTask {}: {}\n", task.id, task.name));
            if !task.description.is_empty() {
                prompt.push_str(&format!("\n{}\n", task.description));
            }
            if !task.dependencies.is_empty() {
                prompt.push_str(&format!(
                    "\nBuilds on tasks: {}\n",
                    task.dependencies.join(", ")
                ));
            }
        }
        Ok(prompt)
    }
}
