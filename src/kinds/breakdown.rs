//! Breakdown project: decompose a body of work into published issues
//!
//! Completed tasks are the work units. Publishing creates one issue per work
//! unit in dependency order and records the issue on the task, so a retry
//! after a partial failure skips what was already published.

use super::{PhaseSpec, ProjectKind};
use crate::errors::WorkflowError;
use crate::graph;
use crate::machine::{Guard, MachineBuilder};
use crate::models::metadata::parse_value;
use crate::models::{phase::status, Project, ProjectType, Task, TaskStatus};
use crate::phases::{
    ensure_not_completed, guards, require, update_task_status, OpResult, PhaseOperations,
};
pub use crate::tracker::{ISSUE_NUMBER, ISSUE_URL};
use crate::tracker::IssueDraft;

pub const BREAKDOWN: &str = "breakdown";

pub const DECOMPOSITION_COMPLETE: &str = "decomposition_complete";

labels! {
    pub enum BreakdownState ("breakdown state") {
        Discovery => "discovery",
        Decomposing => "decomposing",
        Publishing => "publishing",
        Completed => "completed",
    }
}

labels! {
    pub enum BreakdownEvent ("breakdown event") {
        BeginDecomposition => "begin_decomposition",
        DecompositionComplete => "decomposition_complete",
        PublishingComplete => "publishing_complete",
    }
}

pub struct Breakdown;

fn decomposition_done(project: &Project) -> Result<(), String> {
    guards::tasks_resolved(project, BREAKDOWN)?;
    guards::dependencies_valid(project, BREAKDOWN)
}

/// Every completed work unit carries an issue number.
fn all_published(project: &Project) -> Result<(), String> {
    let phase = project.phase(BREAKDOWN).map_err(|e| e.to_string())?;
    let mut missing = Vec::new();
    for task in phase
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
    {
        if issue_number(task).map_err(|e| e.to_string())?.is_none() {
            missing.push(task.id.as_str());
        }
    }
    if !missing.is_empty() {
        return Err(format!(
            "{} work unit(s) not yet published ({})",
            missing.len(),
            missing.join(", ")
        ));
    }
    Ok(())
}

fn issue_number(task: &Task) -> Result<Option<u64>, WorkflowError> {
    task.metadata.get_u64(ISSUE_NUMBER)
}

impl ProjectKind for Breakdown {
    type State = BreakdownState;
    type Event = BreakdownEvent;

    const TYPE: ProjectType = ProjectType::Breakdown;
    const PHASES: &'static [PhaseSpec] = &[PhaseSpec::required(BREAKDOWN)];

    fn initial_state() -> BreakdownState {
        BreakdownState::Discovery
    }

    fn states() -> &'static [BreakdownState] {
        BreakdownState::ALL
    }

    fn events() -> &'static [BreakdownEvent] {
        BreakdownEvent::ALL
    }

    fn transitions() -> MachineBuilder<BreakdownState, BreakdownEvent, Project> {
        use BreakdownEvent as E;
        use BreakdownState as S;

        MachineBuilder::new()
            .add_guarded_transition(
                S::Discovery,
                S::Decomposing,
                E::BeginDecomposition,
                Guard::new("source material tracked", |p: &Project| {
                    guards::has_inputs(p, BREAKDOWN)
                }),
            )
            .add_guarded_transition(
                S::Decomposing,
                S::Publishing,
                E::DecompositionComplete,
                Guard::new("work units resolved and ordered", decomposition_done),
            )
            .add_guarded_transition(
                S::Publishing,
                S::Completed,
                E::PublishingComplete,
                Guard::new("every work unit published", all_published),
            )
    }

    fn phase_of(_state: BreakdownState) -> &'static str {
        BREAKDOWN
    }

    fn phase_status(state: BreakdownState) -> &'static str {
        match state {
            BreakdownState::Discovery => "discovery",
            BreakdownState::Decomposing => "decomposing",
            BreakdownState::Publishing => "publishing",
            BreakdownState::Completed => status::COMPLETED,
        }
    }

    fn operations(state: BreakdownState) -> Box<dyn PhaseOperations<Event = BreakdownEvent>> {
        Box::new(Decompose { state })
    }

    fn guidance(state: BreakdownState, project: &Project) -> String {
        match state {
            BreakdownState::Discovery => {
                "Track the source material as input artifacts, then run 'weft advance'.".to_string()
            }
            BreakdownState::Decomposing => {
                "Add one task per work unit with its dependencies. Complete the ones to publish, then run 'weft set decomposition_complete true'.".to_string()
            }
            BreakdownState::Publishing => {
                "Run 'weft publish' to create an issue for every completed work unit.".to_string()
            }
            BreakdownState::Completed => {
                format!("Breakdown '{}' is published.", project.name)
            }
        }
    }

    fn suggested_role(state: BreakdownState) -> Option<&'static str> {
        match state {
            BreakdownState::Discovery | BreakdownState::Decomposing => Some("decomposer"),
            _ => None,
        }
    }
}

struct Decompose {
    state: BreakdownState,
}

impl Decompose {
    fn publishing(&self) -> Result<(), WorkflowError> {
        if self.state != BreakdownState::Publishing {
            return Err(WorkflowError::validation(format!(
                "work units can only be published in the publishing state (currently {})",
                self.state
            )));
        }
        Ok(())
    }
}

impl PhaseOperations for Decompose {
    type Event = BreakdownEvent;

    fn name(&self) -> &'static str {
        BREAKDOWN
    }

    fn complete(&self, project: &mut Project) -> OpResult<BreakdownEvent> {
        match self.state {
            BreakdownState::Discovery => Err(WorkflowError::validation(
                "discovery is still active. Run 'weft advance' to start decomposing",
            )),
            BreakdownState::Decomposing => Err(WorkflowError::validation(
                "decomposition is still active. Run 'weft set decomposition_complete true'",
            )),
            BreakdownState::Publishing => {
                ensure_not_completed(project, BREAKDOWN)?;
                require(all_published(project), "complete breakdown")?;
                project.phase_mut(BREAKDOWN)?.finish();
                Ok(Some(BreakdownEvent::PublishingComplete))
            }
            BreakdownState::Completed => {
                Err(WorkflowError::validation("the breakdown is already complete"))
            }
        }
    }

    fn advance(&self, project: &mut Project) -> OpResult<BreakdownEvent> {
        if self.state != BreakdownState::Discovery {
            return Err(WorkflowError::validation(format!(
                "nothing to advance in the {} state",
                self.state
            )));
        }
        require(guards::has_inputs(project, BREAKDOWN), "start decomposing")?;
        Ok(Some(BreakdownEvent::BeginDecomposition))
    }

    fn set(&self, project: &mut Project, field: &str, value: &str) -> OpResult<BreakdownEvent> {
        if field != DECOMPOSITION_COMPLETE || parse_value(value) != serde_json::Value::Bool(true) {
            project
                .phase_mut(BREAKDOWN)?
                .metadata
                .set_parsed(field, value);
            return Ok(None);
        }
        if self.state != BreakdownState::Decomposing {
            return Err(WorkflowError::validation(format!(
                "decomposition can only be completed in the decomposing state (currently {})",
                self.state
            )));
        }
        require(guards::tasks_resolved(project, BREAKDOWN), "complete decomposition")?;
        graph::publish_order(&project.phase(BREAKDOWN)?.tasks)?;

        project
            .phase_mut(BREAKDOWN)?
            .metadata
            .set(DECOMPOSITION_COMPLETE, true);
        Ok(Some(BreakdownEvent::DecompositionComplete))
    }

    fn add_task(&self, project: &mut Project, task: Task) -> OpResult<BreakdownEvent> {
        match self.state {
            BreakdownState::Decomposing => {
                project.phase_mut(BREAKDOWN)?.add_task(task)?;
                Ok(None)
            }
            BreakdownState::Discovery => Err(WorkflowError::validation(
                "finish discovery before adding work units. Run 'weft advance'",
            )),
            _ => Err(WorkflowError::validation(
                "no new work units can be added once decomposition is complete",
            )),
        }
    }

    /// Statuses are frozen once decomposition is complete; publishing relies
    /// on every work unit staying completed.
    fn set_task_status(
        &self,
        project: &mut Project,
        task_id: &str,
        status: TaskStatus,
    ) -> OpResult<BreakdownEvent> {
        match self.state {
            BreakdownState::Discovery | BreakdownState::Decomposing => {
                update_task_status(project, BREAKDOWN, task_id, status)?;
                Ok(None)
            }
            _ => Err(WorkflowError::validation(
                "work unit statuses cannot change once decomposition is complete",
            )),
        }
    }

    fn publish_order(&self, project: &Project) -> crate::errors::WorkflowResult<Vec<String>> {
        self.publishing()?;
        graph::publish_order(&project.phase(BREAKDOWN)?.tasks)
    }

    fn issue_draft(
        &self,
        project: &Project,
        task_id: &str,
    ) -> crate::errors::WorkflowResult<IssueDraft> {
        self.publishing()?;
        let phase = project.phase(BREAKDOWN)?;
        let task = phase
            .task(task_id)
            .ok_or_else(|| WorkflowError::validation(format!("no work unit '{task_id}'")))?;

        let mut body = String::new();
        if !task.description.is_empty() {
            body.push_str(&task.description);
            body.push_str("\n\n");
        }
        let mut prerequisites = Vec::new();
        for dep in &task.dependencies {
            let number = phase
                .task(dep)
                .map(issue_number)
                .transpose()?
                .flatten()
                .ok_or_else(|| {
                    WorkflowError::validation(format!(
                        "work unit '{task_id}' depends on '{dep}', which has no issue yet"
                    ))
                })?;
            prerequisites.push(format!("- Depends on #{number}"));
        }
        if !prerequisites.is_empty() {
            body.push_str("## Prerequisites\n\n");
            body.push_str(&prerequisites.join("\n"));
            body.push_str("\n\n");
        }
        body.push_str(&format!("Part of the `{}` breakdown.", project.name));

        Ok(IssueDraft {
            title: task.name.clone(),
            body,
        })
    }

    fn record_issue(
        &self,
        project: &mut Project,
        task_id: &str,
        number: u64,
        url: &str,
    ) -> OpResult<BreakdownEvent> {
        self.publishing()?;
        let task = project
            .phase(BREAKDOWN)?
            .task(task_id)
            .ok_or_else(|| WorkflowError::validation(format!("no work unit '{task_id}'")))?;
        if let Some(existing) = issue_number(task)? {
            return Err(WorkflowError::validation(format!(
                "work unit '{task_id}' is already published as #{existing}"
            )));
        }

        let phase = project.phase_mut(BREAKDOWN)?;
        if let Some(task) = phase.task_mut(task_id) {
            task.metadata.set(ISSUE_NUMBER, number);
            task.metadata.set(ISSUE_URL, url);
        }

        if all_published(project).is_ok() {
            project.phase_mut(BREAKDOWN)?.finish();
            return Ok(Some(BreakdownEvent::PublishingComplete));
        }
        Ok(None)
    }
}
