//! Workflow engine
//!
//! Binds a persisted project to the state machine of its project type and
//! runs every operation as one unit: phase operation, optional transition,
//! schema-validated write. The [`AnyWorkflow`] facade erases the project
//! type so callers can drive whatever project the work directory holds.

mod persistence;
mod publish;
pub mod schema;
mod workflow;


pub use persistence::ProjectStore;
pub use publish::PublishReport;
pub use schema::{ProjectSchema, SchemaValidator};
pub use workflow::Workflow;

use crate::agents::SessionLedger;
use crate::errors::WorkflowResult;
use crate::kinds::{Breakdown, Design, Exploration, ProjectKind, Standard};
use crate::models::{Artifact, ArtifactKind, Project, ProjectType, TaskStatus};
use crate::tracker::IssueTracker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub from: String,
    pub event: String,
    pub to: String,
}

/// What an operation did beyond mutating the project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub transition: Option<TransitionRecord>,
    /// Next-step text for the state entered, if a transition fired.
    pub guidance: Option<String>,
    /// The terminal state was reached and the project tree removed.
    pub finished: bool,
}

/// Arguments of `add_task`. A missing ID is allocated from the phase.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub parallel: bool,
}

/// A workflow of any project type, addressed with string labels.
pub trait AnyWorkflow {
    fn project(&self) -> &Project;
    fn state_label(&self) -> String;
    fn active_phase(&self) -> &'static str;
    fn guidance(&self) -> String;
    fn suggested_role(&self) -> Option<&'static str>;
    fn permitted_events(&self) -> Vec<String>;
    /// Every event registered from the current state with its guard verdict.
    fn candidate_events(&self) -> Vec<(String, Result<(), String>)>;

    fn fire_label(&mut self, event: &str) -> WorkflowResult<Outcome>;
    fn complete(&mut self) -> WorkflowResult<Outcome>;
    fn advance(&mut self) -> WorkflowResult<Outcome>;
    fn set(&mut self, field: &str, value: &str, phase: Option<&str>) -> WorkflowResult<Outcome>;
    fn add_task(&mut self, task: NewTask) -> WorkflowResult<(String, Outcome)>;
    fn set_task_status(&mut self, task_id: &str, status: TaskStatus) -> WorkflowResult<Outcome>;
    fn add_artifact(&mut self, artifact: Artifact, kind: ArtifactKind) -> WorkflowResult<Outcome>;
    fn approve_artifact(&mut self, path: &str) -> WorkflowResult<Outcome>;
    fn skip_phase(&mut self, name: &str) -> WorkflowResult<Outcome>;
    fn enable_phase(&mut self, name: &str) -> WorkflowResult<Outcome>;
    fn publish(
        &mut self,
        tracker: &dyn IssueTracker,
        labels: &[String],
    ) -> WorkflowResult<PublishReport>;

    fn ledger(&mut self) -> &mut dyn SessionLedger;
    fn ledger_ref(&self) -> &dyn SessionLedger;
}

impl<K: ProjectKind> AnyWorkflow for Workflow<K> {
    fn project(&self) -> &Project {
        Workflow::project(self)
    }

    fn state_label(&self) -> String {
        self.state().to_string()
    }

    fn active_phase(&self) -> &'static str {
        Workflow::active_phase(self)
    }

    fn guidance(&self) -> String {
        Workflow::guidance(self)
    }

    fn suggested_role(&self) -> Option<&'static str> {
        K::suggested_role(self.state())
    }

    fn permitted_events(&self) -> Vec<String> {
        Workflow::permitted_events(self)
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    fn candidate_events(&self) -> Vec<(String, Result<(), String>)> {
        self.machine()
            .candidate_events(self.project())
            .into_iter()
            .map(|(e, verdict)| (e.to_string(), verdict))
            .collect()
    }

    fn fire_label(&mut self, event: &str) -> WorkflowResult<Outcome> {
        let event: K::Event = event.parse()?;
        self.fire(event)
    }

    fn complete(&mut self) -> WorkflowResult<Outcome> {
        Workflow::complete(self)
    }

    fn advance(&mut self) -> WorkflowResult<Outcome> {
        Workflow::advance(self)
    }

    fn set(&mut self, field: &str, value: &str, phase: Option<&str>) -> WorkflowResult<Outcome> {
        Workflow::set(self, field, value, phase)
    }

    fn add_task(&mut self, task: NewTask) -> WorkflowResult<(String, Outcome)> {
        Workflow::add_task(self, task)
    }

    fn set_task_status(&mut self, task_id: &str, status: TaskStatus) -> WorkflowResult<Outcome> {
        Workflow::set_task_status(self, task_id, status)
    }

    fn add_artifact(&mut self, artifact: Artifact, kind: ArtifactKind) -> WorkflowResult<Outcome> {
        Workflow::add_artifact(self, artifact, kind)
    }

    fn approve_artifact(&mut self, path: &str) -> WorkflowResult<Outcome> {
        Workflow::approve_artifact(self, path)
    }

    fn skip_phase(&mut self, name: &str) -> WorkflowResult<Outcome> {
        Workflow::skip_phase(self, name)
    }

    fn enable_phase(&mut self, name: &str) -> WorkflowResult<Outcome> {
        Workflow::enable_phase(self, name)
    }

    fn publish(
        &mut self,
        tracker: &dyn IssueTracker,
        labels: &[String],
    ) -> WorkflowResult<PublishReport> {
        Workflow::publish(self, tracker, labels)
    }

    fn ledger(&mut self) -> &mut dyn SessionLedger {
        self
    }

    fn ledger_ref(&self) -> &dyn SessionLedger {
        self
    }
}

/// Load the stored project and bind it to its type's machine.
pub fn open(store: ProjectStore) -> WorkflowResult<Box<dyn AnyWorkflow>> {
    let project = store.load()?;
    Ok(match project.project_type {
        ProjectType::Standard => Box::new(Workflow::<Standard>::open(store, project)?),
        ProjectType::Exploration => Box::new(Workflow::<Exploration>::open(store, project)?),
        ProjectType::Design => Box::new(Workflow::<Design>::open(store, project)?),
        ProjectType::Breakdown => Box::new(Workflow::<Breakdown>::open(store, project)?),
    })
}

/// Start and persist a new project of `project_type`.
pub fn create(
    store: ProjectStore,
    project_type: ProjectType,
    name: &str,
    branch: &str,
    description: &str,
) -> WorkflowResult<Box<dyn AnyWorkflow>> {
    Ok(match project_type {
        ProjectType::Standard => Box::new(Workflow::<Standard>::create(
            store,
            name,
            branch,
            description,
        )?),
        ProjectType::Exploration => Box::new(Workflow::<Exploration>::create(
            store,
            name,
            branch,
            description,
        )?),
        ProjectType::Design => Box::new(Workflow::<Design>::create(
            store,
            name,
            branch,
            description,
        )?),
        ProjectType::Breakdown => Box::new(Workflow::<Breakdown>::create(
            store,
            name,
            branch,
            description,
        )?),
    })
}
