//! Standard project: plan, implement, review, finalize

use super::{PhaseSpec, ProjectKind};
use crate::errors::WorkflowError;
use crate::graph::DependencyGraph;
use crate::machine::{Guard, MachineBuilder};
use crate::models::metadata::parse_value;
use crate::models::{phase::status, Artifact, ArtifactKind, Project, ProjectType};
use crate::phases::{ensure_not_completed, guards, require, OpResult, PhaseOperations};

pub const PLANNING: &str = "planning";
pub const IMPLEMENTATION: &str = "implementation";
pub const REVIEW: &str = "review";
pub const FINALIZE: &str = "finalize";

/// Implementation flag that approves the task list.
pub const TASKS_APPROVED: &str = "tasks_approved";
/// Implementation counter bumped by every failed review. Review reports carry
/// the value current when they were added.
pub const ITERATION: &str = "iteration";
/// Review output metadata carrying the verdict.
pub const ASSESSMENT: &str = "assessment";
pub const PR_URL: &str = "pr_url";

labels! {
    pub enum StandardState ("standard state") {
        PlanningActive => "planning_active",
        ImplementationPlanning => "implementation_planning",
        ImplementationExecuting => "implementation_executing",
        ReviewActive => "review_active",
        FinalizeChecks => "finalize_checks",
        FinalizePrCreation => "finalize_pr_creation",
        FinalizeCleanup => "finalize_cleanup",
        Completed => "completed",
    }
}

labels! {
    pub enum StandardEvent ("standard event") {
        PlanningComplete => "planning_complete",
        TasksApproved => "tasks_approved",
        AllTasksComplete => "all_tasks_complete",
        ReviewSkipped => "review_skipped",
        ReviewPass => "review_pass",
        ReviewFail => "review_fail",
        ChecksComplete => "checks_complete",
        PrCreated => "pr_created",
        Finished => "finished",
    }
}

pub struct Standard;

impl ProjectKind for Standard {
    type State = StandardState;
    type Event = StandardEvent;

    const TYPE: ProjectType = ProjectType::Standard;
    const PHASES: &'static [PhaseSpec] = &[
        PhaseSpec::required(PLANNING),
        PhaseSpec::required(IMPLEMENTATION),
        PhaseSpec::optional(REVIEW),
        PhaseSpec::required(FINALIZE),
    ];

    fn initial_state() -> StandardState {
        StandardState::PlanningActive
    }

    fn states() -> &'static [StandardState] {
        StandardState::ALL
    }

    fn events() -> &'static [StandardEvent] {
        StandardEvent::ALL
    }

    fn transitions() -> MachineBuilder<StandardState, StandardEvent, Project> {
        use StandardEvent as E;
        use StandardState as S;

        MachineBuilder::new()
            .add_guarded_transition(
                S::PlanningActive,
                S::ImplementationPlanning,
                E::PlanningComplete,
                Guard::new("planning outputs approved", |p: &Project| {
                    guards::outputs_approved(p, PLANNING)
                }),
            )
            .add_guarded_transition(
                S::ImplementationPlanning,
                S::ImplementationExecuting,
                E::TasksApproved,
                Guard::new("task list approved", |p: &Project| {
                    guards::has_tasks(p, IMPLEMENTATION, 1)?;
                    guards::flag_set(p, IMPLEMENTATION, TASKS_APPROVED)
                }),
            )
            .add_guarded_transition(
                S::ImplementationExecuting,
                S::ReviewActive,
                E::AllTasksComplete,
                Guard::new("tasks resolved and review enabled", |p: &Project| {
                    guards::tasks_resolved(p, IMPLEMENTATION)?;
                    guards::phase_enabled(p, REVIEW)
                }),
            )
            .add_guarded_transition(
                S::ImplementationExecuting,
                S::FinalizeChecks,
                E::ReviewSkipped,
                Guard::new("tasks resolved and review skipped", |p: &Project| {
                    guards::tasks_resolved(p, IMPLEMENTATION)?;
                    guards::phase_skipped(p, REVIEW)
                }),
            )
            .add_guarded_transition(
                S::ReviewActive,
                S::FinalizeChecks,
                E::ReviewPass,
                Guard::new("review passed", |p: &Project| review_verdict(p, "pass")),
            )
            .add_guarded_transition(
                S::ReviewActive,
                S::ImplementationPlanning,
                E::ReviewFail,
                Guard::new("review failed", |p: &Project| review_verdict(p, "fail")),
            )
            .add_transition(S::FinalizeChecks, S::FinalizePrCreation, E::ChecksComplete)
            .add_guarded_transition(
                S::FinalizePrCreation,
                S::FinalizeCleanup,
                E::PrCreated,
                Guard::new("pull request recorded", |p: &Project| {
                    guards::metadata_present(p, FINALIZE, PR_URL)
                }),
            )
            .add_transition(S::FinalizeCleanup, S::Completed, E::Finished)
    }

    fn phase_of(state: StandardState) -> &'static str {
        match state {
            StandardState::PlanningActive => PLANNING,
            StandardState::ImplementationPlanning | StandardState::ImplementationExecuting => {
                IMPLEMENTATION
            }
            StandardState::ReviewActive => REVIEW,
            StandardState::FinalizeChecks
            | StandardState::FinalizePrCreation
            | StandardState::FinalizeCleanup
            | StandardState::Completed => FINALIZE,
        }
    }

    fn phase_status(state: StandardState) -> &'static str {
        match state {
            StandardState::PlanningActive | StandardState::ReviewActive => status::ACTIVE,
            StandardState::ImplementationPlanning => "planning",
            StandardState::ImplementationExecuting => "executing",
            StandardState::FinalizeChecks => "checks",
            StandardState::FinalizePrCreation => "pr_creation",
            StandardState::FinalizeCleanup => "cleanup",
            StandardState::Completed => status::COMPLETED,
        }
    }

    fn operations(state: StandardState) -> Box<dyn PhaseOperations<Event = StandardEvent>> {
        match state {
            StandardState::PlanningActive => Box::new(Planning),
            StandardState::ImplementationPlanning => Box::new(Implementation { executing: false }),
            StandardState::ImplementationExecuting => Box::new(Implementation { executing: true }),
            StandardState::ReviewActive => Box::new(Review),
            StandardState::FinalizeChecks
            | StandardState::FinalizePrCreation
            | StandardState::FinalizeCleanup
            | StandardState::Completed => Box::new(Finalize { state }),
        }
    }

    fn guidance(state: StandardState, project: &Project) -> String {
        match state {
            StandardState::PlanningActive => {
                "Plan the work. Record the plan as an output artifact, approve it, then run 'weft complete'.".to_string()
            }
            StandardState::ImplementationPlanning => {
                let iteration = project
                    .phase(IMPLEMENTATION)
                    .ok()
                    .and_then(|p| p.metadata.get_u64(ITERATION).ok().flatten())
                    .unwrap_or(0);
                let prefix = if iteration > 0 {
                    format!("Review requested changes (iteration {iteration}). ")
                } else {
                    String::new()
                };
                format!("{prefix}Break the plan into tasks with 'weft task add', then approve them with 'weft set tasks_approved true'.")
            }
            StandardState::ImplementationExecuting => {
                "Work the tasks. Mark each one completed or abandoned, then run 'weft complete'.".to_string()
            }
            StandardState::ReviewActive => {
                "Review the implementation. Add a review report with '--meta assessment=pass|fail', approve it, then run 'weft complete'.".to_string()
            }
            StandardState::FinalizeChecks => {
                "Run final checks (tests, docs), then 'weft advance'.".to_string()
            }
            StandardState::FinalizePrCreation => {
                "Open a pull request and record it with 'weft set pr_url <url>'.".to_string()
            }
            StandardState::FinalizeCleanup => {
                "Clean up temporary files, then run 'weft complete' to close the project.".to_string()
            }
            StandardState::Completed => format!("Project '{}' is complete.", project.name),
        }
    }

    fn on_enter(from: Option<StandardState>, to: StandardState, project: &mut Project) {
        if from != Some(StandardState::ReviewActive) || to != StandardState::ImplementationPlanning {
            return;
        }
        let Ok(implementation) = project.phase_mut(IMPLEMENTATION) else {
            return;
        };
        let iteration = implementation
            .metadata
            .get_u64(ITERATION)
            .ok()
            .flatten()
            .unwrap_or(0);
        implementation.metadata.set(ITERATION, iteration + 1);
        implementation.metadata.set(TASKS_APPROVED, false);
    }

    fn suggested_role(state: StandardState) -> Option<&'static str> {
        match state {
            StandardState::PlanningActive | StandardState::ImplementationPlanning => Some("planner"),
            StandardState::ImplementationExecuting => Some("implementer"),
            StandardState::ReviewActive => Some("reviewer"),
            _ => None,
        }
    }
}

/// Current review round. Unset counts as round 0.
fn review_round(project: &Project) -> Result<u64, String> {
    let implementation = project.phase(IMPLEMENTATION).map_err(|e| e.to_string())?;
    let round = implementation
        .metadata
        .get_u64(ITERATION)
        .map_err(|e| e.to_string())?;
    Ok(round.unwrap_or(0))
}

/// Verdict of the most recent approved review report of the current round.
/// Reports from earlier rounds never decide a later one.
fn review_verdict(project: &Project, expected: &str) -> Result<(), String> {
    let round = review_round(project)?;
    let review = project.phase(REVIEW).map_err(|e| e.to_string())?;
    let latest = review
        .approved_outputs()
        .into_iter()
        .rfind(|report| {
            let stamp = report.metadata.get_u64(ITERATION).ok().flatten();
            stamp.unwrap_or(0) == round
        })
        .ok_or_else(|| format!("no approved review report for iteration {round}"))?;
    let verdict = latest
        .metadata
        .get_str(ASSESSMENT)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("review report '{}' has no assessment", latest.path))?;
    if verdict != expected {
        return Err(format!("latest review assessment is '{verdict}'"));
    }
    Ok(())
}

struct Planning;

impl PhaseOperations for Planning {
    type Event = StandardEvent;

    fn name(&self) -> &'static str {
        PLANNING
    }

    fn complete(&self, project: &mut Project) -> OpResult<StandardEvent> {
        ensure_not_completed(project, PLANNING)?;
        require(guards::outputs_approved(project, PLANNING), "complete planning")?;
        project.phase_mut(PLANNING)?.finish();
        Ok(Some(StandardEvent::PlanningComplete))
    }
}

struct Implementation {
    executing: bool,
}

impl PhaseOperations for Implementation {
    type Event = StandardEvent;

    fn name(&self) -> &'static str {
        IMPLEMENTATION
    }

    fn complete(&self, project: &mut Project) -> OpResult<StandardEvent> {
        if !self.executing {
            return Err(WorkflowError::validation(
                "tasks have not been approved yet. Run 'weft set tasks_approved true' first",
            ));
        }
        ensure_not_completed(project, IMPLEMENTATION)?;
        require(
            guards::tasks_resolved(project, IMPLEMENTATION),
            "complete implementation",
        )?;
        let review_enabled = project.phase(REVIEW)?.enabled;
        project.phase_mut(IMPLEMENTATION)?.finish();
        Ok(Some(if review_enabled {
            StandardEvent::AllTasksComplete
        } else {
            StandardEvent::ReviewSkipped
        }))
    }

    fn set(&self, project: &mut Project, field: &str, value: &str) -> OpResult<StandardEvent> {
        if field != TASKS_APPROVED || parse_value(value) != serde_json::Value::Bool(true) {
            project
                .phase_mut(IMPLEMENTATION)?
                .metadata
                .set_parsed(field, value);
            return Ok(None);
        }
        if self.executing {
            return Err(WorkflowError::validation("tasks are already approved"));
        }
        require(
            guards::has_tasks(project, IMPLEMENTATION, 1),
            "approve tasks",
        )?;
        DependencyGraph::from_tasks(&project.phase(IMPLEMENTATION)?.tasks).validate()?;

        project
            .phase_mut(IMPLEMENTATION)?
            .metadata
            .set(TASKS_APPROVED, true);
        Ok(Some(StandardEvent::TasksApproved))
    }
}

struct Review;

impl PhaseOperations for Review {
    type Event = StandardEvent;

    fn name(&self) -> &'static str {
        REVIEW
    }

    fn complete(&self, project: &mut Project) -> OpResult<StandardEvent> {
        ensure_not_completed(project, REVIEW)?;
        require(guards::no_pending_outputs(project, REVIEW), "complete review")?;

        if review_verdict(project, "pass").is_ok() {
            project.phase_mut(REVIEW)?.finish();
            return Ok(Some(StandardEvent::ReviewPass));
        }
        // Anything other than a failing verdict is a missing precondition.
        require(review_verdict(project, "fail"), "complete review")?;
        Ok(Some(StandardEvent::ReviewFail))
    }

    fn add_artifact(
        &self,
        project: &mut Project,
        mut artifact: Artifact,
        kind: ArtifactKind,
    ) -> OpResult<StandardEvent> {
        if kind == ArtifactKind::Output {
            let round = review_round(project).map_err(WorkflowError::validation)?;
            artifact.metadata.set(ITERATION, round);
        }
        project.phase_mut(REVIEW)?.add_artifact(artifact, kind)?;
        Ok(None)
    }
}

struct Finalize {
    state: StandardState,
}

impl Finalize {
    fn wrong_step(&self, hint: &str) -> WorkflowError {
        WorkflowError::validation(format!(
            "finalize is in its {} step. {hint}",
            Standard::phase_status(self.state)
        ))
    }
}

impl PhaseOperations for Finalize {
    type Event = StandardEvent;

    fn name(&self) -> &'static str {
        FINALIZE
    }

    fn complete(&self, project: &mut Project) -> OpResult<StandardEvent> {
        match self.state {
            StandardState::FinalizeCleanup => {
                ensure_not_completed(project, FINALIZE)?;
                project.phase_mut(FINALIZE)?.finish();
                Ok(Some(StandardEvent::Finished))
            }
            StandardState::FinalizeChecks => Err(self.wrong_step("Run 'weft advance' once checks pass")),
            StandardState::FinalizePrCreation => {
                Err(self.wrong_step("Record the pull request with 'weft set pr_url <url>'"))
            }
            _ => Err(WorkflowError::validation("the project is already complete")),
        }
    }

    fn advance(&self, _project: &mut Project) -> OpResult<StandardEvent> {
        match self.state {
            StandardState::FinalizeChecks => Ok(Some(StandardEvent::ChecksComplete)),
            StandardState::FinalizePrCreation => {
                Err(self.wrong_step("Record the pull request with 'weft set pr_url <url>'"))
            }
            StandardState::FinalizeCleanup => Err(self.wrong_step("Run 'weft complete'")),
            _ => Err(WorkflowError::validation("the project is already complete")),
        }
    }

    fn set(&self, project: &mut Project, field: &str, value: &str) -> OpResult<StandardEvent> {
        if field == PR_URL {
            if value.trim().is_empty() {
                return Err(WorkflowError::validation("pr_url cannot be empty"));
            }
            project.phase_mut(FINALIZE)?.metadata.set(PR_URL, value);
            if self.state == StandardState::FinalizePrCreation {
                return Ok(Some(StandardEvent::PrCreated));
            }
            return Ok(None);
        }
        project.phase_mut(FINALIZE)?.metadata.set_parsed(field, value);
        Ok(None)
    }
}
