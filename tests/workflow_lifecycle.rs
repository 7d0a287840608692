//! Integration tests for project lifecycles persisted on disk
//!
//! Every step reopens the project from `.weft/project/state.yaml` so the
//! tests exercise the same load, mutate, persist path as the CLI.

use std::fs;
use std::rc::Rc;

use tempfile::TempDir;
use weft::engine::{self, AnyWorkflow, NewTask, ProjectSchema, ProjectStore};
use weft::errors::WorkflowError;
use weft::fs::{FsDocumentStore, WorkDir, WorkspaceLock};
use weft::models::{Artifact, ArtifactKind, ProjectType, TaskStatus};

fn setup() -> (TempDir, WorkDir, ProjectStore) {
    let temp = TempDir::new().unwrap();
    let work_dir = WorkDir::new(temp.path());
    work_dir.ensure().unwrap();
    let store = ProjectStore::for_work_dir(Rc::new(FsDocumentStore), Rc::new(ProjectSchema), &work_dir);
    (temp, work_dir, store)
}

fn reopen(store: &ProjectStore) -> Box<dyn AnyWorkflow> {
    engine::open(store.clone()).expect("project should reopen")
}

fn task(name: &str) -> NewTask {
    NewTask {
        name: name.to_string(),
        ..NewTask::default()
    }
}

#[test]
fn test_design_project_runs_to_completion() {
    let (_temp, work_dir, store) = setup();
    engine::create(store.clone(), ProjectType::Design, "api-v2", "main", "API redesign").unwrap();
    assert!(work_dir.state_path().exists());

    let (id, _) = reopen(&store).add_task(task("api doc")).unwrap();
    assert_eq!(id, "010");

    let draft = Artifact::new("docs/api.md")
        .requiring_approval()
        .linked_to(Some(id.clone()));
    reopen(&store).add_artifact(draft, ArtifactKind::Output).unwrap();

    let err = reopen(&store).complete().unwrap_err();
    assert!(err.to_string().contains("cannot complete design"), "{err}");

    // Completing the task approves the linked draft.
    reopen(&store).set_task_status(&id, TaskStatus::Completed).unwrap();
    let outcome = reopen(&store).complete().unwrap();
    assert_eq!(outcome.transition.unwrap().to, "finalizing");

    let yaml = fs::read_to_string(work_dir.state_path()).unwrap();
    assert!(yaml.contains("state: finalizing"), "{yaml}");

    let outcome = reopen(&store).complete().unwrap();
    assert!(outcome.finished);
    assert!(!work_dir.project_dir().exists());
    assert!(work_dir.root().exists());
}

#[test]
fn test_exploration_state_survives_reopen() {
    let (_temp, _work_dir, store) = setup();
    engine::create(store.clone(), ProjectType::Exploration, "cache-options", "main", "").unwrap();

    reopen(&store).add_task(task("redis")).unwrap();
    reopen(&store).add_task(task("memcached")).unwrap();
    reopen(&store).set_task_status("010", TaskStatus::Completed).unwrap();

    let err = reopen(&store).advance().unwrap_err();
    assert!(err.to_string().contains("1 unresolved task"), "{err}");

    reopen(&store).set_task_status("020", TaskStatus::Abandoned).unwrap();
    reopen(&store).advance().unwrap();

    let workflow = reopen(&store);
    assert_eq!(workflow.state_label(), "summarizing");
    assert_eq!(workflow.suggested_role(), Some("researcher"));
    assert!(workflow.project().phase("exploration").unwrap().is("summarizing"));
}

#[test]
fn test_second_init_is_rejected() {
    let (_temp, _work_dir, store) = setup();
    engine::create(store.clone(), ProjectType::Standard, "add-auth", "main", "").unwrap();

    let err = engine::create(store, ProjectType::Breakdown, "billing", "main", "")
        .err()
        .unwrap();
    assert!(matches!(err, WorkflowError::ProjectExists(_)));
}

#[test]
fn test_hand_edited_state_is_rejected_on_load() {
    let (_temp, work_dir, store) = setup();
    engine::create(store.clone(), ProjectType::Standard, "add-auth", "main", "").unwrap();

    let yaml = fs::read_to_string(work_dir.state_path()).unwrap();
    fs::write(
        work_dir.state_path(),
        yaml.replace("state: planning_active", "state: shipping"),
    )
    .unwrap();

    let err = engine::open(store).err().unwrap();
    let message = err.to_string();
    assert!(message.contains("validate project"), "{message}");
    assert!(message.contains("'shipping' is not a standard state"), "{message}");
}

#[test]
fn test_rejected_operation_keeps_file_bytes() {
    let (_temp, work_dir, store) = setup();
    engine::create(store.clone(), ProjectType::Breakdown, "billing", "main", "").unwrap();
    let before = fs::read(work_dir.state_path()).unwrap();

    assert!(reopen(&store).advance().is_err());
    assert!(reopen(&store).add_task(task("schema")).is_err());
    assert!(reopen(&store).fire_label("publishing_complete").is_err());

    assert_eq!(fs::read(work_dir.state_path()).unwrap(), before);
}

#[test]
fn test_workspace_lock_is_exclusive() {
    let (_temp, work_dir, _store) = setup();

    let held = WorkspaceLock::acquire(&work_dir.lock_path()).unwrap();
    let err = WorkspaceLock::acquire(&work_dir.lock_path()).err().unwrap();
    assert!(err.to_string().contains("is locked"), "{err}");

    drop(held);
    assert!(WorkspaceLock::acquire(&work_dir.lock_path()).is_ok());
}
