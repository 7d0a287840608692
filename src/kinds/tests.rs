//! Tests for the project type vocabularies

use super::breakdown::{BreakdownEvent, BreakdownState, BREAKDOWN, ISSUE_NUMBER};
use super::design::{DesignEvent, DesignState, DESIGN};
use super::exploration::{ExplorationState, EXPLORATION};
use super::standard::{StandardEvent, StandardState, IMPLEMENTATION, PLANNING, REVIEW};
use super::*;
use crate::models::{Artifact, ArtifactKind, Task, TaskStatus};

/// Run `op` against the current state's phase and fire whatever it returns.
fn drive<K, F>(machine: &mut ProjectMachine<K>, project: &mut Project, op: F) -> WorkflowResult<()>
where
    K: ProjectKind,
    F: FnOnce(&dyn PhaseOperations<Event = K::Event>, &mut Project) -> WorkflowResult<Option<K::Event>>,
{
    let ops = K::operations(machine.current());
    if let Some(event) = op(ops.as_ref(), project)? {
        machine.fire(event, project)?;
    }
    Ok(())
}

#[test]
fn test_every_kind_builds_a_machine() {
    assert!(Standard::machine(Standard::initial_state()).is_ok());
    assert!(Exploration::machine(Exploration::initial_state()).is_ok());
    assert!(Design::machine(Design::initial_state()).is_ok());
    assert!(Breakdown::machine(Breakdown::initial_state()).is_ok());
}

#[test]
fn test_completed_is_terminal_everywhere() {
    assert!(Standard::machine(StandardState::Completed)
        .unwrap()
        .is_terminal(StandardState::Completed));
    assert!(Design::machine(DesignState::Completed)
        .unwrap()
        .is_terminal(DesignState::Completed));
    assert!(Breakdown::machine(BreakdownState::Completed)
        .unwrap()
        .is_terminal(BreakdownState::Completed));
}

#[test]
fn test_labels_parse_and_reject() {
    assert_eq!(
        "review_active".parse::<StandardState>().unwrap(),
        StandardState::ReviewActive
    );
    let err = "bogus".parse::<StandardEvent>().unwrap_err();
    assert!(err.to_string().contains("unknown standard event 'bogus'"));
}

#[test]
fn test_new_project_activates_first_phase() {
    let project = Standard::new_project("add-auth", "feat/auth", "");
    assert_eq!(project.state, "planning_active");
    assert_eq!(project.phases.len(), 4);
    assert!(project.phase(PLANNING).unwrap().is(status::ACTIVE));
    assert!(project.phase(PLANNING).unwrap().started_at.is_some());
    assert!(project.phase(IMPLEMENTATION).unwrap().is(status::PENDING));
}

#[test]
fn test_entry_hook_moves_phase_bookkeeping() {
    let mut project = Standard::new_project("add-auth", "main", "");
    let mut machine = Standard::machine(Standard::initial_state()).unwrap();

    let phase = project.phase_mut(PLANNING).unwrap();
    phase
        .add_artifact(Artifact::new("plan.md").requiring_approval(), ArtifactKind::Output)
        .unwrap();
    phase.approve_output("plan.md").unwrap();

    drive::<Standard, _>(&mut machine, &mut project, |ops, p| ops.complete(p)).unwrap();

    assert_eq!(machine.current(), StandardState::ImplementationPlanning);
    assert_eq!(project.state, "implementation_planning");
    assert!(project.phase(PLANNING).unwrap().is(status::COMPLETED));
    assert!(project.phase(IMPLEMENTATION).unwrap().is("planning"));
}

#[test]
fn test_standard_tasks_approved_via_set() {
    let mut project = Standard::new_project("add-auth", "main", "");
    let mut machine = Standard::machine(StandardState::ImplementationPlanning).unwrap();
    project.state = StandardState::ImplementationPlanning.to_string();

    let err = drive::<Standard, _>(&mut machine, &mut project, |ops, p| {
        ops.set(p, "tasks_approved", "true")
    })
    .unwrap_err();
    assert!(err.to_string().contains("0 tasks"), "{err}");

    drive::<Standard, _>(&mut machine, &mut project, |ops, p| {
        ops.add_task(p, Task::new("010", "login form"))
    })
    .unwrap();
    drive::<Standard, _>(&mut machine, &mut project, |ops, p| {
        ops.set(p, "tasks_approved", "true")
    })
    .unwrap();
    assert_eq!(machine.current(), StandardState::ImplementationExecuting);
}

#[test]
fn test_skipped_review_goes_straight_to_finalize() {
    let mut project = Standard::new_project("add-auth", "main", "");
    let review = project.phase_mut(REVIEW).unwrap();
    review.enabled = false;
    review.status = status::SKIPPED.to_string();
    project
        .phase_mut(IMPLEMENTATION)
        .unwrap()
        .add_task(Task::new("010", "work").with_status(TaskStatus::Completed))
        .unwrap();
    project.state = StandardState::ImplementationExecuting.to_string();
    let mut machine = Standard::machine(StandardState::ImplementationExecuting).unwrap();

    drive::<Standard, _>(&mut machine, &mut project, |ops, p| ops.complete(p)).unwrap();
    assert_eq!(machine.current(), StandardState::FinalizeChecks);
}

#[test]
fn test_failed_review_returns_to_planning() {
    let mut project = Standard::new_project("add-auth", "main", "");
    project.state = StandardState::ReviewActive.to_string();
    let mut machine = Standard::machine(StandardState::ReviewActive).unwrap();
    let mut report = Artifact::new("review.md").requiring_approval();
    report.metadata.set("assessment", "fail");
    let review = project.phase_mut(REVIEW).unwrap();
    review.add_artifact(report, ArtifactKind::Output).unwrap();
    review.approve_output("review.md").unwrap();

    drive::<Standard, _>(&mut machine, &mut project, |ops, p| ops.complete(p)).unwrap();

    assert_eq!(machine.current(), StandardState::ImplementationPlanning);
    let implementation = project.phase(IMPLEMENTATION).unwrap();
    assert_eq!(implementation.metadata.get_u64("iteration").unwrap(), Some(1));
    assert!(!implementation.metadata.flag("tasks_approved").unwrap());
}

#[test]
fn test_review_reports_belong_to_their_iteration() {
    let mut project = Standard::new_project("add-auth", "main", "");
    project.state = StandardState::ReviewActive.to_string();
    project
        .phase_mut(IMPLEMENTATION)
        .unwrap()
        .metadata
        .set("iteration", 1u64);
    let mut machine = Standard::machine(StandardState::ReviewActive).unwrap();
    let mut stale = Artifact::new("review.md").requiring_approval();
    stale.metadata.set("assessment", "pass");
    let review = project.phase_mut(REVIEW).unwrap();
    review.add_artifact(stale, ArtifactKind::Output).unwrap();
    review.approve_output("review.md").unwrap();

    let err = drive::<Standard, _>(&mut machine, &mut project, |ops, p| ops.complete(p))
        .unwrap_err();
    assert!(err.to_string().contains("for iteration 1"), "{err}");
    assert_eq!(machine.current(), StandardState::ReviewActive);

    let mut report = Artifact::new("review-2.md").requiring_approval();
    report.metadata.set("assessment", "pass");
    drive::<Standard, _>(&mut machine, &mut project, |ops, p| {
        ops.add_artifact(p, report, ArtifactKind::Output)
    })
    .unwrap();
    let stamped = project.phase(REVIEW).unwrap().output("review-2.md").unwrap();
    assert_eq!(stamped.metadata.get_u64("iteration").unwrap(), Some(1));

    drive::<Standard, _>(&mut machine, &mut project, |ops, p| {
        ops.approve_artifact(p, "review-2.md")
    })
    .unwrap();
    drive::<Standard, _>(&mut machine, &mut project, |ops, p| ops.complete(p)).unwrap();
    assert_eq!(machine.current(), StandardState::FinalizeChecks);
}

#[test]
fn test_exploration_rejects_topics_while_summarizing() {
    let mut project = Exploration::new_project("cache-options", "main", "");
    let mut machine = Exploration::machine(Exploration::initial_state()).unwrap();
    project
        .phase_mut(EXPLORATION)
        .unwrap()
        .add_task(Task::new("010", "redis").with_status(TaskStatus::Completed))
        .unwrap();

    drive::<Exploration, _>(&mut machine, &mut project, |ops, p| ops.advance(p)).unwrap();
    assert_eq!(machine.current(), ExplorationState::Summarizing);
    assert!(project.phase(EXPLORATION).unwrap().is("summarizing"));

    let err = drive::<Exploration, _>(&mut machine, &mut project, |ops, p| {
        ops.add_task(p, Task::new("020", "memcached"))
    })
    .unwrap_err();
    assert!(err.to_string().contains("summarizing"));
}

#[test]
fn test_design_requires_a_task_before_drafts() {
    let mut project = Design::new_project("api-v2", "main", "");
    let ops = Design::operations(DesignState::Active);
    let draft = || {
        Artifact::new("docs/api.md")
            .requiring_approval()
            .linked_to(None)
    };

    let err = ops
        .add_artifact(&mut project, draft(), ArtifactKind::Output)
        .unwrap_err();
    assert!(err.to_string().contains("plan before drafting"));
    assert!(project.phase(DESIGN).unwrap().outputs.is_empty());

    ops.add_task(&mut project, Task::new("010", "api doc")).unwrap();
    ops.add_artifact(&mut project, draft(), ArtifactKind::Output)
        .unwrap();
    assert_eq!(project.phase(DESIGN).unwrap().outputs.len(), 1);
}

#[test]
fn test_design_completion_auto_approves_and_finishes() {
    let mut project = Design::new_project("api-v2", "main", "");
    let mut machine = Design::machine(Design::initial_state()).unwrap();
    let ops = Design::operations(DesignState::Active);
    ops.add_task(&mut project, Task::new("010", "api doc")).unwrap();
    ops.add_artifact(
        &mut project,
        Artifact::new("docs/api.md")
            .requiring_approval()
            .linked_to(Some("010".into())),
        ArtifactKind::Output,
    )
    .unwrap();
    ops.set_task_status(&mut project, "010", TaskStatus::Completed)
        .unwrap();

    let event = ops.complete(&mut project).unwrap();
    assert_eq!(event, Some(DesignEvent::DesignComplete));
    machine.fire(DesignEvent::DesignComplete, &mut project).unwrap();
    assert_eq!(machine.current(), DesignState::Finalizing);
    assert!(project.phase(DESIGN).unwrap().is(status::COMPLETED));
}

#[test]
fn test_breakdown_publishing_records_issues_in_order() {
    let mut project = Breakdown::new_project("billing", "main", "");
    let phase = project.phase_mut(BREAKDOWN).unwrap();
    phase
        .add_task(Task::new("010", "schema").with_status(TaskStatus::Completed))
        .unwrap();
    phase
        .add_task(
            Task::new("020", "api")
                .with_dependencies(vec!["010".into()])
                .with_status(TaskStatus::Completed),
        )
        .unwrap();
    let ops = Breakdown::operations(BreakdownState::Publishing);

    assert_eq!(ops.publish_order(&project).unwrap(), vec!["010", "020"]);

    let err = ops.issue_draft(&project, "020").unwrap_err();
    assert!(err.to_string().contains("has no issue yet"));

    assert_eq!(
        ops.record_issue(&mut project, "010", 41, "https://example.test/41")
            .unwrap(),
        None
    );
    let draft = ops.issue_draft(&project, "020").unwrap();
    assert_eq!(draft.title, "api");
    assert!(draft.body.contains("Depends on #41"));

    let event = ops
        .record_issue(&mut project, "020", 42, "https://example.test/42")
        .unwrap();
    assert_eq!(event, Some(BreakdownEvent::PublishingComplete));
    let task = project.phase(BREAKDOWN).unwrap().task("020").unwrap();
    assert_eq!(task.metadata.get_u64(ISSUE_NUMBER).unwrap(), Some(42));
}

#[test]
fn test_breakdown_publish_unsupported_before_publishing() {
    let project = Breakdown::new_project("billing", "main", "");
    let ops = Breakdown::operations(BreakdownState::Decomposing);
    assert!(ops.publish_order(&project).is_err());
}

#[test]
fn test_phase_spec_lookup() {
    assert!(Standard::phase_spec(REVIEW).unwrap().optional);
    assert!(!Standard::phase_spec(PLANNING).unwrap().optional);
    assert!(Design::phase_spec("review").is_err());
}
