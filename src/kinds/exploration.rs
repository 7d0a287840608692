//! Exploration project: research topics, then summarize findings

use super::{PhaseSpec, ProjectKind};
use crate::errors::WorkflowError;
use crate::machine::{Guard, MachineBuilder};
use crate::models::{phase::status, Project, ProjectType, Task};
use crate::phases::finalization::{Finalization, FINALIZATION};
use crate::phases::{ensure_not_completed, guards, require, OpResult, PhaseOperations};

pub const EXPLORATION: &str = "exploration";

labels! {
    pub enum ExplorationState ("exploration state") {
        Active => "active",
        Summarizing => "summarizing",
        Finalizing => "finalizing",
        Completed => "completed",
    }
}

labels! {
    pub enum ExplorationEvent ("exploration event") {
        BeginSummarizing => "begin_summarizing",
        SummaryComplete => "summary_complete",
        Finished => "finished",
    }
}

pub struct Exploration;

impl ProjectKind for Exploration {
    type State = ExplorationState;
    type Event = ExplorationEvent;

    const TYPE: ProjectType = ProjectType::Exploration;
    const PHASES: &'static [PhaseSpec] = &[
        PhaseSpec::required(EXPLORATION),
        PhaseSpec::required(FINALIZATION),
    ];

    fn initial_state() -> ExplorationState {
        ExplorationState::Active
    }

    fn states() -> &'static [ExplorationState] {
        ExplorationState::ALL
    }

    fn events() -> &'static [ExplorationEvent] {
        ExplorationEvent::ALL
    }

    fn transitions() -> MachineBuilder<ExplorationState, ExplorationEvent, Project> {
        use ExplorationEvent as E;
        use ExplorationState as S;

        MachineBuilder::new()
            .add_guarded_transition(
                S::Active,
                S::Summarizing,
                E::BeginSummarizing,
                Guard::new("research topics resolved", |p: &Project| {
                    guards::tasks_resolved(p, EXPLORATION)
                }),
            )
            .add_guarded_transition(
                S::Summarizing,
                S::Finalizing,
                E::SummaryComplete,
                Guard::new("summary approved", |p: &Project| {
                    guards::outputs_approved(p, EXPLORATION)
                }),
            )
            .add_transition(S::Finalizing, S::Completed, E::Finished)
    }

    fn phase_of(state: ExplorationState) -> &'static str {
        match state {
            ExplorationState::Active | ExplorationState::Summarizing => EXPLORATION,
            ExplorationState::Finalizing | ExplorationState::Completed => FINALIZATION,
        }
    }

    fn phase_status(state: ExplorationState) -> &'static str {
        match state {
            ExplorationState::Active | ExplorationState::Finalizing => status::ACTIVE,
            ExplorationState::Summarizing => "summarizing",
            ExplorationState::Completed => status::COMPLETED,
        }
    }

    fn operations(state: ExplorationState) -> Box<dyn PhaseOperations<Event = ExplorationEvent>> {
        match state {
            ExplorationState::Active => Box::new(Research { summarizing: false }),
            ExplorationState::Summarizing => Box::new(Research { summarizing: true }),
            ExplorationState::Finalizing | ExplorationState::Completed => {
                Box::new(Finalization::new(ExplorationEvent::Finished))
            }
        }
    }

    fn guidance(state: ExplorationState, project: &Project) -> String {
        match state {
            ExplorationState::Active => {
                "Add research topics with 'weft task add' and work through them. Run 'weft advance' once every topic is resolved.".to_string()
            }
            ExplorationState::Summarizing => {
                "Write up the findings as an output artifact, approve it, then run 'weft complete'.".to_string()
            }
            ExplorationState::Finalizing => {
                "Move the summary to its permanent location, then run 'weft complete'.".to_string()
            }
            ExplorationState::Completed => format!("Exploration '{}' is complete.", project.name),
        }
    }

    fn suggested_role(state: ExplorationState) -> Option<&'static str> {
        match state {
            ExplorationState::Active | ExplorationState::Summarizing => Some("researcher"),
            _ => None,
        }
    }
}

struct Research {
    summarizing: bool,
}

impl PhaseOperations for Research {
    type Event = ExplorationEvent;

    fn name(&self) -> &'static str {
        EXPLORATION
    }

    fn complete(&self, project: &mut Project) -> OpResult<ExplorationEvent> {
        if !self.summarizing {
            return Err(WorkflowError::validation(
                "research is still active. Run 'weft advance' to start summarizing",
            ));
        }
        ensure_not_completed(project, EXPLORATION)?;
        require(
            guards::outputs_approved(project, EXPLORATION),
            "complete exploration",
        )?;
        project.phase_mut(EXPLORATION)?.finish();
        Ok(Some(ExplorationEvent::SummaryComplete))
    }

    fn advance(&self, project: &mut Project) -> OpResult<ExplorationEvent> {
        if self.summarizing {
            return Err(WorkflowError::validation(
                "already summarizing. Run 'weft complete' once the summary is approved",
            ));
        }
        require(
            guards::tasks_resolved(project, EXPLORATION),
            "start summarizing",
        )?;
        Ok(Some(ExplorationEvent::BeginSummarizing))
    }

    fn add_task(&self, project: &mut Project, task: Task) -> OpResult<ExplorationEvent> {
        if self.summarizing {
            return Err(WorkflowError::validation(
                "no new research topics can be added while summarizing",
            ));
        }
        project.phase_mut(EXPLORATION)?.add_task(task)?;
        Ok(None)
    }
}
