use tracing::{info, warn};

use super::persistence::ProjectStore;
use super::{NewTask, Outcome, TransitionRecord};
use crate::agents::{SessionKey, SessionLedger};
use crate::errors::{WorkflowError, WorkflowResult};
use crate::kinds::{ProjectKind, ProjectMachine};
use crate::machine::Transitioned;
use crate::models::phase::status;
use crate::models::{next_task_id, Artifact, ArtifactKind, Project, Task, TaskStatus};
use crate::phases::{OpResult, PhaseOperations};
use crate::validation;

/// A loaded project bound to its project type's machine.
///
/// Every operation works on a copy of the project. The copy replaces the
/// loaded project only once the operation, any transition it triggers, and
/// the write of the state document have all succeeded.
pub struct Workflow<K: ProjectKind> {
    pub(super) project: Project,
    pub(super) machine: ProjectMachine<K>,
    pub(super) store: ProjectStore,
}

impl<K: ProjectKind> Workflow<K> {
    /// Start a new project and persist it.
    pub fn create(
        store: ProjectStore,
        name: &str,
        branch: &str,
        description: &str,
    ) -> WorkflowResult<Self> {
        validation::validate_project_name(name)
            .map_err(|e| WorkflowError::validation(e.to_string()))?;
        validation::validate_description(description)
            .map_err(|e| WorkflowError::validation(e.to_string()))?;
        if store.exists() {
            let existing = store
                .load()
                .map(|p| p.name)
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(WorkflowError::ProjectExists(existing));
        }

        let project = K::new_project(name, branch, description);
        let machine = K::machine(K::initial_state())?;
        store.save(&project)?;
        info!(project = name, kind = %K::TYPE, "project created");

        Ok(Self {
            project,
            machine,
            store,
        })
    }

    /// Bind an already loaded project; its persisted state becomes the
    /// machine's initial state.
    pub fn open(store: ProjectStore, project: Project) -> WorkflowResult<Self> {
        if project.project_type != K::TYPE {
            return Err(WorkflowError::validation(format!(
                "project '{}' is a {} project, not {}",
                project.name,
                project.project_type,
                K::TYPE
            )));
        }
        let state: K::State = project.state.parse()?;
        let machine = K::machine(state)?;
        Ok(Self {
            project,
            machine,
            store,
        })
    }

    pub fn load(store: ProjectStore) -> WorkflowResult<Self> {
        let project = store.load()?;
        Self::open(store, project)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn state(&self) -> K::State {
        self.machine.current()
    }

    pub fn machine(&self) -> &ProjectMachine<K> {
        &self.machine
    }

    pub fn active_phase(&self) -> &'static str {
        K::phase_of(self.state())
    }

    pub fn guidance(&self) -> String {
        K::guidance(self.state(), &self.project)
    }

    pub fn permitted_events(&self) -> Vec<K::Event> {
        self.machine.permitted_events(&self.project)
    }

    /// Run a phase operation of the current state and fire the event it
    /// returns, if any.
    pub(super) fn apply<F>(&mut self, op: F) -> WorkflowResult<Outcome>
    where
        F: FnOnce(&dyn PhaseOperations<Event = K::Event>, &mut Project) -> OpResult<K::Event>,
    {
        let previous = self.state();
        let ops = K::operations(previous);
        let mut draft = self.project.clone();

        let event = op(ops.as_ref(), &mut draft)?;
        let transitioned = match event {
            Some(event) => Some(self.machine.fire(event, &mut draft)?),
            None => None,
        };

        self.commit(draft, previous, transitioned)
    }

    /// Persist `draft` and make it current. On a failed write the machine is
    /// rolled back to `previous` and the loaded project is kept.
    fn commit(
        &mut self,
        mut draft: Project,
        previous: K::State,
        transitioned: Option<Transitioned<K::State, K::Event>>,
    ) -> WorkflowResult<Outcome> {
        draft.touch();
        if let Err(err) = self.store.save(&draft) {
            self.machine.restore(previous);
            return Err(err);
        }
        self.project = draft;

        let Some(transition) = transitioned else {
            return Ok(Outcome::default());
        };
        info!(
            project = %self.project.name,
            from = %transition.from,
            event = %transition.event,
            to = %transition.to,
            "transitioned"
        );

        let finished = self.machine.is_terminal(transition.to);
        if finished {
            self.cleanup();
        }
        Ok(Outcome {
            transition: Some(TransitionRecord {
                from: transition.from.to_string(),
                event: transition.event.to_string(),
                to: transition.to.to_string(),
            }),
            guidance: Some(transition.guidance),
            finished,
        })
    }

    /// Best-effort removal of the project tree once the terminal state is
    /// reached. The transition is already durable, so a failure only warns.
    fn cleanup(&self) {
        match self.store.delete() {
            Ok(()) => info!(project = %self.project.name, "project tree removed"),
            Err(err) => warn!(project = %self.project.name, "failed to remove project tree: {err}"),
        }
    }

    /// Fire an event directly, bypassing phase operations.
    pub fn fire(&mut self, event: K::Event) -> WorkflowResult<Outcome> {
        let previous = self.state();
        let mut draft = self.project.clone();
        let transitioned = self.machine.fire(event, &mut draft)?;
        self.commit(draft, previous, Some(transitioned))
    }

    pub fn complete(&mut self) -> WorkflowResult<Outcome> {
        self.apply(|ops, project| ops.complete(project))
    }

    pub fn advance(&mut self) -> WorkflowResult<Outcome> {
        self.apply(|ops, project| ops.advance(project))
    }

    /// Write `field` on the active phase, or on `phase` when given. Only the
    /// active phase interprets fields as workflow signals.
    pub fn set(&mut self, field: &str, value: &str, phase: Option<&str>) -> WorkflowResult<Outcome> {
        if field.trim().is_empty() {
            return Err(WorkflowError::validation("field name cannot be empty"));
        }
        match phase {
            Some(name) if name != self.active_phase() => {
                K::phase_spec(name)?;
                self.apply(|_, project| {
                    project.phase_mut(name)?.metadata.set_parsed(field, value);
                    Ok(None)
                })
            }
            _ => self.apply(|ops, project| ops.set(project, field, value)),
        }
    }

    /// Add a task to the active phase. Returns the task ID.
    pub fn add_task(&mut self, new: NewTask) -> WorkflowResult<(String, Outcome)> {
        let id = match new.id {
            Some(id) => id,
            None => next_task_id(&self.project.phase(self.active_phase())?.tasks)?,
        };
        validation::validate_id(&id).map_err(|e| WorkflowError::validation(e.to_string()))?;
        validation::validate_description(&new.description)
            .map_err(|e| WorkflowError::validation(e.to_string()))?;

        let mut task = Task::new(id.clone(), new.name)
            .with_description(new.description)
            .with_dependencies(new.dependencies);
        task.parallel = new.parallel;

        let outcome = self.apply(|ops, project| ops.add_task(project, task))?;
        Ok((id, outcome))
    }

    pub fn set_task_status(&mut self, task_id: &str, status: TaskStatus) -> WorkflowResult<Outcome> {
        self.apply(|ops, project| ops.set_task_status(project, task_id, status))
    }

    pub fn add_artifact(&mut self, artifact: Artifact, kind: ArtifactKind) -> WorkflowResult<Outcome> {
        if artifact.path.trim().is_empty() {
            return Err(WorkflowError::validation("artifact path cannot be empty"));
        }
        self.apply(|ops, project| ops.add_artifact(project, artifact, kind))
    }

    pub fn approve_artifact(&mut self, path: &str) -> WorkflowResult<Outcome> {
        self.apply(|ops, project| ops.approve_artifact(project, path))
    }

    /// Skip an optional phase that has not started.
    pub fn skip_phase(&mut self, name: &str) -> WorkflowResult<Outcome> {
        let spec = K::phase_spec(name)?;
        if !spec.optional {
            return Err(WorkflowError::validation(format!(
                "the {name} phase is required and cannot be skipped"
            )));
        }
        self.apply(|_, project| {
            let phase = project.phase_mut(name)?;
            if phase.is(status::SKIPPED) {
                return Err(WorkflowError::validation(format!(
                    "the {name} phase is already skipped"
                )));
            }
            if !phase.is(status::PENDING) {
                return Err(WorkflowError::validation(format!(
                    "the {name} phase has already started"
                )));
            }
            phase.enabled = false;
            phase.status = status::SKIPPED.to_string();
            Ok(None)
        })
    }

    /// Re-enable a skipped optional phase.
    pub fn enable_phase(&mut self, name: &str) -> WorkflowResult<Outcome> {
        let spec = K::phase_spec(name)?;
        if !spec.optional {
            return Err(WorkflowError::validation(format!(
                "the {name} phase is required and always enabled"
            )));
        }
        self.apply(|_, project| {
            let phase = project.phase_mut(name)?;
            if phase.enabled {
                return Err(WorkflowError::validation(format!(
                    "the {name} phase is already enabled"
                )));
            }
            phase.enabled = true;
            phase.status = status::PENDING.to_string();
            Ok(None)
        })
    }
}

impl<K: ProjectKind> std::fmt::Debug for Workflow<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("project", &self.project.name)
            .field("state", &self.state())
            .field("store", &self.store)
            .finish()
    }
}

impl<K: ProjectKind> SessionLedger for Workflow<K> {
    fn session_for(&self, key: &SessionKey) -> WorkflowResult<Option<String>> {
        match key {
            SessionKey::Task(id) => self
                .project
                .find_task(id)
                .map(|(_, task)| task.session_id.clone())
                .ok_or_else(|| WorkflowError::validation(format!("no task '{id}' in this project"))),
            SessionKey::Role(role) => Ok(self.project.agent_sessions.get(role).cloned()),
        }
    }

    fn record_session(&mut self, key: &SessionKey, session_id: &str) -> WorkflowResult<()> {
        let previous = self.state();
        let mut draft = self.project.clone();
        match key {
            SessionKey::Task(id) => {
                let task = draft.find_task_mut(id).ok_or_else(|| {
                    WorkflowError::validation(format!("no task '{id}' in this project"))
                })?;
                if task.session_id.is_some() {
                    return Err(WorkflowError::validation(format!(
                        "task '{id}' already has a session"
                    )));
                }
                task.session_id = Some(session_id.to_string());
            }
            SessionKey::Role(role) => {
                if draft.agent_sessions.contains_key(role) {
                    return Err(WorkflowError::validation(format!(
                        "role '{role}' already has a session"
                    )));
                }
                draft
                    .agent_sessions
                    .insert(role.clone(), session_id.to_string());
            }
        }
        self.commit(draft, previous, None).map(|_| ())
    }
}
