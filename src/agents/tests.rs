//! Tests for the agent registry, executors and session protocol

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::executor::create_executor;
use super::*;
use crate::config::{AgentConfig, ExecutorConfig};
use crate::errors::{WorkflowError, WorkflowResult};
use crate::models::Task;

type Log = Rc<RefCell<Vec<String>>>;

struct FakeLedger {
    sessions: HashMap<SessionKey, String>,
    tasks: Vec<String>,
    log: Log,
}

impl FakeLedger {
    fn new(tasks: &[&str], log: Log) -> Self {
        Self {
            sessions: HashMap::new(),
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
            log,
        }
    }
}

impl SessionLedger for FakeLedger {
    fn session_for(&self, key: &SessionKey) -> WorkflowResult<Option<String>> {
        if let SessionKey::Task(id) = key {
            if !self.tasks.contains(id) {
                return Err(WorkflowError::validation(format!("no task '{id}'")));
            }
        }
        Ok(self.sessions.get(key).cloned())
    }

    fn record_session(&mut self, key: &SessionKey, session_id: &str) -> WorkflowResult<()> {
        self.log.borrow_mut().push(format!("record {session_id}"));
        self.sessions.insert(key.clone(), session_id.to_string());
        Ok(())
    }
}

struct FakeExecutor {
    log: Log,
    resumable: bool,
    crash: bool,
}

impl AgentExecutor for FakeExecutor {
    fn name(&self) -> &str {
        "fake"
    }

    fn spawn(&self, role: &str, _prompt: &str, session_id: &str) -> anyhow::Result<()> {
        self.log
            .borrow_mut()
            .push(format!("spawn {role} {session_id}"));
        if self.crash {
            anyhow::bail!("agent process died");
        }
        Ok(())
    }

    fn resume(&self, session_id: &str, _prompt: &str) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("resume {session_id}"));
        Ok(())
    }

    fn supports_resumption(&self) -> bool {
        self.resumable
    }
}

fn fake(log: &Log) -> FakeExecutor {
    FakeExecutor {
        log: Rc::clone(log),
        resumable: true,
        crash: false,
    }
}

#[test]
fn test_session_is_persisted_before_agent_starts() {
    let log: Log = Rc::default();
    let mut ledger = FakeLedger::new(&["010"], Rc::clone(&log));
    let executor = fake(&log);
    let manager = SessionManager::new(&executor);

    let key = SessionKey::Task("010".into());
    let session_id = manager
        .spawn(&mut ledger, &key, "implementer", "do it")
        .unwrap();

    assert!(uuid::Uuid::parse_str(&session_id).is_ok());
    assert_eq!(
        *log.borrow(),
        vec![
            format!("record {session_id}"),
            format!("spawn implementer {session_id}")
        ]
    );
    assert_eq!(ledger.session_for(&key).unwrap(), Some(session_id));
}

#[test]
fn test_crash_during_agent_keeps_session_for_resume() {
    let log: Log = Rc::default();
    let mut ledger = FakeLedger::new(&["010"], Rc::clone(&log));
    let key = SessionKey::Task("010".into());

    let crashing = FakeExecutor {
        crash: true,
        ..fake(&log)
    };
    let err = SessionManager::new(&crashing)
        .spawn(&mut ledger, &key, "implementer", "do it")
        .unwrap_err();
    assert!(matches!(err, WorkflowError::External { .. }));
    let recorded = ledger.session_for(&key).unwrap().unwrap();

    let executor = fake(&log);
    let resumed = SessionManager::new(&executor)
        .resume(&ledger, &key, "continue")
        .unwrap();
    assert_eq!(resumed, recorded);
    assert_eq!(log.borrow().last().unwrap(), &format!("resume {recorded}"));
    assert_eq!(ledger.session_for(&key).unwrap().unwrap(), recorded);
}

#[test]
fn test_resume_before_spawn_fails() {
    let log: Log = Rc::default();
    let mut ledger = FakeLedger::new(&["010", "020"], Rc::clone(&log));
    let executor = fake(&log);
    let manager = SessionManager::new(&executor);

    manager
        .spawn(&mut ledger, &SessionKey::Task("010".into()), "implementer", "go")
        .unwrap();

    let err = manager
        .resume(&ledger, &SessionKey::Task("020".into()), "feedback")
        .unwrap_err();
    assert!(err.to_string().contains("no session found"), "{err}");
}

#[test]
fn test_second_spawn_reuses_recorded_session() {
    let log: Log = Rc::default();
    let mut ledger = FakeLedger::new(&[], Rc::clone(&log));
    let executor = fake(&log);
    let manager = SessionManager::new(&executor);
    let key = SessionKey::Role("planner".into());

    let first = manager.spawn(&mut ledger, &key, "planner", "plan").unwrap();
    let second = manager.spawn(&mut ledger, &key, "planner", "plan").unwrap();

    assert_eq!(first, second);
    let records = log
        .borrow()
        .iter()
        .filter(|l| l.starts_with("record"))
        .count();
    assert_eq!(records, 1);
}

#[test]
fn test_resume_on_non_resumable_executor_is_unsupported() {
    let log: Log = Rc::default();
    let mut ledger = FakeLedger::new(&["010"], Rc::clone(&log));
    let key = SessionKey::Task("010".into());
    ledger.record_session(&key, "abc").unwrap();

    let executor = FakeExecutor {
        resumable: false,
        ..fake(&log)
    };
    let err = SessionManager::new(&executor)
        .resume(&ledger, &key, "again")
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ResumptionUnsupported(ref name) if name == "fake"));
    assert!(!err.is_retryable());
}

#[test]
fn test_spawn_for_unknown_task_fails_without_recording() {
    let log: Log = Rc::default();
    let mut ledger = FakeLedger::new(&["010"], Rc::clone(&log));
    let executor = fake(&log);

    let result = SessionManager::new(&executor).spawn(
        &mut ledger,
        &SessionKey::Task("999".into()),
        "implementer",
        "go",
    );
    assert!(result.is_err());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_registry_defaults_and_config_overrides() {
    let mut registry = AgentRegistry::with_defaults();
    for role in ["planner", "implementer", "reviewer", "researcher", "architect", "decomposer"] {
        assert!(registry.get(role).is_ok(), "missing {role}");
    }

    let mut agents = BTreeMap::new();
    agents.insert(
        "reviewer".to_string(),
        AgentConfig {
            description: None,
            prompt: Some("Be strict.".to_string()),
        },
    );
    agents.insert(
        "security".to_string(),
        AgentConfig {
            description: Some("Audits".to_string()),
            prompt: Some("Find vulnerabilities.".to_string()),
        },
    );
    registry.extend_from_config(&agents);

    let reviewer = registry.get("reviewer").unwrap();
    assert_eq!(reviewer.instructions, "Be strict.");
    assert_eq!(reviewer.description, "Reviews completed work");
    assert_eq!(registry.get("security").unwrap().description, "Audits");

    let err = registry.get("poet").unwrap_err();
    assert!(err.to_string().contains("unknown agent role 'poet'"));
}

#[test]
fn test_prompt_includes_task() {
    let registry = AgentRegistry::with_defaults();
    let task = Task::new("020", "Add login form")
        .with_description("Email and password fields")
        .with_dependencies(vec!["010".into()]);

    let prompt = registry
        .prompt_for("implementer", "add-auth", "Work the tasks.", Some(&task))
        .unwrap();
    assert!(prompt.starts_with("You implement exactly one task."));
    assert!(prompt.contains("Task 020: Add login form"));
    assert!(prompt.contains("Builds on tasks: 010"));
}

#[test]
fn test_executor_kind_parsing() {
    assert_eq!("claude".parse::<ExecutorKind>().unwrap(), ExecutorKind::Claude);
    assert_eq!("COMMAND".parse::<ExecutorKind>().unwrap(), ExecutorKind::Command);
    assert!("tmux".parse::<ExecutorKind>().is_err());
    assert_eq!(ExecutorKind::default().to_string(), "claude");
}

#[test]
fn test_executor_registry_from_config() {
    let temp = tempfile::tempdir().unwrap();
    let config = ExecutorConfig::default();
    let registry = ExecutorRegistry::from_config(&config, temp.path()).unwrap();
    assert_eq!(registry.names(), vec!["claude"]);
    assert!(registry.get(None).unwrap().supports_resumption());
    assert!(registry.get(Some("command")).is_err());

    let config = ExecutorConfig {
        command: Some("true".to_string()),
        ..ExecutorConfig::default()
    };
    let registry = ExecutorRegistry::from_config(&config, temp.path()).unwrap();
    assert!(!registry.get(Some("command")).unwrap().supports_resumption());
}

#[test]
fn test_command_executor_needs_configured_command() {
    let temp = tempfile::tempdir().unwrap();
    let result = create_executor(ExecutorKind::Command, &ExecutorConfig::default(), temp.path());
    assert!(result.is_err());
}

#[test]
fn test_command_executor_passes_prompt_and_session() {
    let temp = tempfile::tempdir().unwrap();
    let executor = CommandExecutor::new(
        "printf '%s %s' \"$WEFT_ROLE\" \"$WEFT_SESSION_ID\" > env.txt; cat > prompt.txt",
    )
    .in_dir(temp.path());

    executor.spawn("researcher", "look into caching", "s-1").unwrap();

    let env = std::fs::read_to_string(temp.path().join("env.txt")).unwrap();
    assert_eq!(env, "researcher s-1");
    let prompt = std::fs::read_to_string(temp.path().join("prompt.txt")).unwrap();
    assert_eq!(prompt, "look into caching");
}

#[test]
fn test_command_executor_reports_failure() {
    let executor = CommandExecutor::new("exit 3");
    let err = executor.spawn("planner", "", "s-2").unwrap_err();
    assert!(err.to_string().contains("exited with status 3"));
}
