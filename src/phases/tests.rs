//! Tests for the shared phase operations and guard predicates

use super::finalization::{Finalization, FINALIZATION};
use super::*;
use crate::models::{Phase, ProjectType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Done,
}

/// Minimal phase relying on every default operation.
struct Work;

const WORK: &str = "work";

impl PhaseOperations for Work {
    type Event = Event;

    fn name(&self) -> &'static str {
        WORK
    }

    fn complete(&self, project: &mut Project) -> OpResult<Event> {
        ensure_not_completed(project, WORK)?;
        require(guards::tasks_resolved(project, WORK), "complete work")?;
        project.phase_mut(WORK)?.finish();
        Ok(Some(Event::Done))
    }
}

fn project() -> Project {
    let mut project = Project::new("demo", "main", "", ProjectType::Standard, "active");
    project.phases.insert(WORK.to_string(), Phase::new(true));
    project
        .phases
        .insert(FINALIZATION.to_string(), Phase::new(true));
    project
}

#[test]
fn test_complete_reports_unresolved_count() {
    let mut project = project();
    let phase = project.phase_mut(WORK).unwrap();
    phase
        .add_task(Task::new("001", "a").with_status(TaskStatus::Completed))
        .unwrap();
    phase.add_task(Task::new("002", "b")).unwrap();
    let before = project.clone();

    let err = Work.complete(&mut project).unwrap_err();
    assert!(err.to_string().contains("1 unresolved task"), "{err}");
    assert_eq!(project, before);
}

#[test]
fn test_complete_requires_one_completed_task() {
    let mut project = project();
    project
        .phase_mut(WORK)
        .unwrap()
        .add_task(Task::new("001", "a").with_status(TaskStatus::Abandoned))
        .unwrap();

    let err = Work.complete(&mut project).unwrap_err();
    assert!(err.to_string().contains("no task has been completed"));
}

#[test]
fn test_complete_twice_is_an_error() {
    let mut project = project();
    project
        .phase_mut(WORK)
        .unwrap()
        .add_task(Task::new("001", "a").with_status(TaskStatus::Completed))
        .unwrap();

    assert_eq!(Work.complete(&mut project).unwrap(), Some(Event::Done));
    let err = Work.complete(&mut project).unwrap_err();
    assert!(err.to_string().contains("already completed"));
}

#[test]
fn test_advance_defaults_to_unsupported() {
    let mut project = project();
    let err = Work.advance(&mut project).unwrap_err();
    assert!(matches!(err, WorkflowError::Unsupported(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_set_stores_parsed_metadata_without_event() {
    let mut project = project();
    assert_eq!(Work.set(&mut project, "iteration", "2").unwrap(), None);
    assert_eq!(
        project.phase(WORK).unwrap().metadata.get_u64("iteration").unwrap(),
        Some(2)
    );
}

#[test]
fn test_completing_task_auto_approves_linked_outputs() {
    let mut project = project();
    Work.add_task(&mut project, Task::new("010", "draft")).unwrap();
    Work.add_artifact(
        &mut project,
        Artifact::new("design.md")
            .requiring_approval()
            .linked_to(Some("010".into())),
        ArtifactKind::Output,
    )
    .unwrap();

    Work.set_task_status(&mut project, "010", TaskStatus::Completed)
        .unwrap();
    let phase = project.phase(WORK).unwrap();
    assert!(phase.output("design.md").unwrap().approved.is_approved());
}

#[test]
fn test_unknown_task_status_update_fails() {
    let mut project = project();
    let err = Work
        .set_task_status(&mut project, "404", TaskStatus::Completed)
        .unwrap_err();
    assert!(err.to_string().contains("no task '404'"));
}

#[test]
fn test_publishing_defaults_to_unsupported() {
    let project = project();
    assert!(matches!(
        Work.publish_order(&project),
        Err(WorkflowError::Unsupported(_))
    ));
}

#[test]
fn test_finalization_blocks_on_pending_outputs() {
    let mut project = project();
    let finalization = Finalization::new(Event::Done);
    finalization
        .add_artifact(
            &mut project,
            Artifact::new("notes.md").requiring_approval(),
            ArtifactKind::Output,
        )
        .unwrap();

    let err = finalization.complete(&mut project).unwrap_err();
    assert!(err.to_string().contains("1 artifact awaiting approval"));

    finalization
        .approve_artifact(&mut project, "notes.md")
        .unwrap();
    assert_eq!(finalization.complete(&mut project).unwrap(), Some(Event::Done));
}

#[test]
fn test_outputs_approved_needs_at_least_one() {
    let project = project();
    let reason = guards::outputs_approved(&project, WORK).unwrap_err();
    assert!(reason.contains("no approved output"));
}
