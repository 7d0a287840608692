//! Design project: plan documents as tasks, draft them, finalize

use super::{PhaseSpec, ProjectKind};
use crate::errors::WorkflowError;
use crate::machine::{Guard, MachineBuilder};
use crate::models::{phase::status, Artifact, ArtifactKind, Project, ProjectType};
use crate::phases::finalization::{Finalization, FINALIZATION};
use crate::phases::{ensure_not_completed, guards, require, OpResult, PhaseOperations};

pub const DESIGN: &str = "design";

labels! {
    pub enum DesignState ("design state") {
        Active => "active",
        Finalizing => "finalizing",
        Completed => "completed",
    }
}

labels! {
    pub enum DesignEvent ("design event") {
        DesignComplete => "design_complete",
        Finished => "finished",
    }
}

pub struct Design;

fn design_done(project: &Project) -> Result<(), String> {
    guards::tasks_resolved(project, DESIGN)?;
    guards::no_pending_outputs(project, DESIGN)
}

impl ProjectKind for Design {
    type State = DesignState;
    type Event = DesignEvent;

    const TYPE: ProjectType = ProjectType::Design;
    const PHASES: &'static [PhaseSpec] = &[
        PhaseSpec::required(DESIGN),
        PhaseSpec::required(FINALIZATION),
    ];

    fn initial_state() -> DesignState {
        DesignState::Active
    }

    fn states() -> &'static [DesignState] {
        DesignState::ALL
    }

    fn events() -> &'static [DesignEvent] {
        DesignEvent::ALL
    }

    fn transitions() -> MachineBuilder<DesignState, DesignEvent, Project> {
        MachineBuilder::new()
            .add_guarded_transition(
                DesignState::Active,
                DesignState::Finalizing,
                DesignEvent::DesignComplete,
                Guard::new("documents drafted and approved", design_done),
            )
            .add_transition(
                DesignState::Finalizing,
                DesignState::Completed,
                DesignEvent::Finished,
            )
    }

    fn phase_of(state: DesignState) -> &'static str {
        match state {
            DesignState::Active => DESIGN,
            DesignState::Finalizing | DesignState::Completed => FINALIZATION,
        }
    }

    fn phase_status(state: DesignState) -> &'static str {
        match state {
            DesignState::Active | DesignState::Finalizing => status::ACTIVE,
            DesignState::Completed => status::COMPLETED,
        }
    }

    fn operations(state: DesignState) -> Box<dyn PhaseOperations<Event = DesignEvent>> {
        match state {
            DesignState::Active => Box::new(Drafting),
            DesignState::Finalizing | DesignState::Completed => {
                Box::new(Finalization::new(DesignEvent::Finished))
            }
        }
    }

    fn guidance(state: DesignState, project: &Project) -> String {
        match state {
            DesignState::Active => {
                "Plan each document as a task, then draft it as an output artifact linked to that task ('--task <id>'). Completing the task approves the draft.".to_string()
            }
            DesignState::Finalizing => {
                "Move the approved documents to their target locations, then run 'weft complete'.".to_string()
            }
            DesignState::Completed => format!("Design '{}' is complete.", project.name),
        }
    }

    fn suggested_role(state: DesignState) -> Option<&'static str> {
        match state {
            DesignState::Active => Some("architect"),
            _ => None,
        }
    }
}

struct Drafting;

impl PhaseOperations for Drafting {
    type Event = DesignEvent;

    fn name(&self) -> &'static str {
        DESIGN
    }

    fn complete(&self, project: &mut Project) -> OpResult<DesignEvent> {
        ensure_not_completed(project, DESIGN)?;
        require(design_done(project), "complete design")?;
        project.phase_mut(DESIGN)?.finish();
        Ok(Some(DesignEvent::DesignComplete))
    }

    /// Documents are planned as tasks before any draft is tracked.
    fn add_artifact(
        &self,
        project: &mut Project,
        artifact: Artifact,
        kind: ArtifactKind,
    ) -> OpResult<DesignEvent> {
        if kind == ArtifactKind::Output && project.phase(DESIGN)?.tasks.is_empty() {
            return Err(WorkflowError::validation(
                "plan before drafting: add a task for this document before adding output artifacts",
            ));
        }
        project.phase_mut(DESIGN)?.add_artifact(artifact, kind)?;
        Ok(None)
    }
}
