//! Dependency graph over the tasks of a phase
//!
//! Validates dependency references and cycles, and computes the order in
//! which dependent tasks can safely be executed or published.

mod cycle;
mod scheduling;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::errors::{WorkflowError, WorkflowResult};
use crate::models::{Task, TaskStatus};

/// Tasks and their dependency edges, in task insertion order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Task IDs in insertion order
    nodes: Vec<String>,
    /// task_id -> IDs it depends on
    dependencies: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Graph over every task regardless of status.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        Self::build(tasks.iter())
    }

    /// Graph restricted to tasks in `status`. Edges pointing outside the
    /// restricted set are kept so validation can report them.
    pub fn with_status(tasks: &[Task], status: TaskStatus) -> Self {
        Self::build(tasks.iter().filter(|t| t.status == status))
    }

    fn build<'a>(tasks: impl Iterator<Item = &'a Task>) -> Self {
        let mut nodes = Vec::new();
        let mut dependencies = HashMap::new();
        for task in tasks {
            nodes.push(task.id.clone());
            let mut deps: Vec<String> = Vec::new();
            for dep in &task.dependencies {
                if !deps.contains(dep) {
                    deps.push(dep.clone());
                }
            }
            dependencies.insert(task.id.clone(), deps);
        }
        Self {
            nodes,
            dependencies,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.dependencies.contains_key(id)
    }

    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.dependencies
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check that every edge resolves inside the graph and that there are no
    /// cycles (a self-dependency counts as a one-node cycle).
    pub fn validate(&self) -> WorkflowResult<()> {
        for id in &self.nodes {
            for dep in self.dependencies_of(id) {
                if !self.contains(dep) {
                    return Err(WorkflowError::MissingDependency {
                        task: id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = cycle::find_cycle(&self.nodes, &self.dependencies) {
            return Err(WorkflowError::Cycle(cycle));
        }

        Ok(())
    }

    /// Topological order: every task after all of its dependencies, ties
    /// broken by insertion order. Fails without a partial order if the graph
    /// is invalid.
    pub fn order(&self) -> WorkflowResult<Vec<String>> {
        self.validate()?;
        scheduling::topological_order(&self.nodes, &self.dependencies)
    }
}

/// Validate and order the completed tasks of a phase.
pub fn publish_order(tasks: &[Task]) -> WorkflowResult<Vec<String>> {
    DependencyGraph::with_status(tasks, TaskStatus::Completed).order()
}
