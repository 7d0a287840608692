//! Project types
//!
//! Each project type is a zero-sized kind carrying its own state and event
//! vocabulary, phase set, transition table and per-state phase operations.
//! The engine is generic over [`ProjectKind`]; the persisted type
//! discriminator selects the kind at load time.

use std::str::FromStr;

use crate::errors::{WorkflowError, WorkflowResult};
use crate::machine::{Label, MachineBuilder, StateMachine};
use crate::models::phase::status;
use crate::models::{Phase, Project, ProjectType};
use crate::phases::PhaseOperations;

/// Declare a state or event vocabulary: a fieldless enum with a stable
/// snake_case label used for persistence and on the command line.
macro_rules! labels {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($noun:literal) {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::errors::WorkflowError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let known: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        $crate::errors::WorkflowError::validation(format!(
                            "unknown {} '{}'. Expected one of: {}",
                            $noun,
                            s,
                            known.join(", ")
                        ))
                    })
            }
        }
    };
}

pub mod breakdown;
pub mod design;
pub mod exploration;
pub mod standard;

#[cfg(test)]
mod tests;

pub use breakdown::Breakdown;
pub use design::Design;
pub use exploration::Exploration;
pub use standard::Standard;

/// A phase declared by a project type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    pub name: &'static str,
    /// Optional phases can be skipped or re-enabled before they start.
    pub optional: bool,
}

impl PhaseSpec {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            optional: true,
        }
    }
}

pub type ProjectMachine<K> =
    StateMachine<<K as ProjectKind>::State, <K as ProjectKind>::Event, Project>;

pub trait ProjectKind: Sized + 'static {
    type State: Label + FromStr<Err = WorkflowError>;
    type Event: Label + FromStr<Err = WorkflowError>;

    const TYPE: ProjectType;
    /// Phases in workflow order.
    const PHASES: &'static [PhaseSpec];

    fn initial_state() -> Self::State;

    fn states() -> &'static [Self::State];

    fn events() -> &'static [Self::Event];

    /// The transition table, without the entry hook.
    fn transitions() -> MachineBuilder<Self::State, Self::Event, Project>;

    /// Phase that owns `state`.
    fn phase_of(state: Self::State) -> &'static str;

    /// Status the owning phase carries while the project is in `state`.
    fn phase_status(state: Self::State) -> &'static str;

    /// Operations available while the project is in `state`.
    fn operations(state: Self::State) -> Box<dyn PhaseOperations<Event = Self::Event>>;

    /// Next-step text for the user once `state` is entered.
    fn guidance(state: Self::State, project: &Project) -> String;

    /// Agent role best suited to the work of `state`.
    fn suggested_role(_state: Self::State) -> Option<&'static str> {
        None
    }

    /// Type-specific bookkeeping when `to` is entered from `from`. Runs after
    /// the phase statuses are updated and before guidance is rendered.
    fn on_enter(_from: Option<Self::State>, _to: Self::State, _project: &mut Project) {}

    fn machine(initial: Self::State) -> WorkflowResult<ProjectMachine<Self>> {
        Self::transitions().on_entry(enter::<Self>).build(initial)
    }

    /// A fresh project in the initial state with every phase created and the
    /// first one active.
    fn new_project(name: &str, branch: &str, description: &str) -> Project {
        let initial = Self::initial_state();
        let mut project = Project::new(name, branch, description, Self::TYPE, initial.to_string());
        for spec in Self::PHASES {
            project
                .phases
                .insert(spec.name.to_string(), Phase::new(true));
        }
        activate::<Self>(initial, &mut project);
        project
    }

    fn phase_spec(name: &str) -> WorkflowResult<&'static PhaseSpec> {
        Self::PHASES.iter().find(|p| p.name == name).ok_or_else(|| {
            let known: Vec<&str> = Self::PHASES.iter().map(|p| p.name).collect();
            WorkflowError::validation(format!(
                "{} projects have no '{name}' phase. Phases: {}",
                Self::TYPE,
                known.join(", ")
            ))
        })
    }
}

/// Entry hook shared by every project type.
///
/// Records the new state on the project, closes the previous phase when the
/// owning phase changes and brings the new phase's status in line.
pub fn enter<K: ProjectKind>(state: K::State, project: &mut Project) -> String {
    let from = project.state.parse::<K::State>().ok();
    let phase = K::phase_of(state);
    project.state = state.to_string();

    if let Some(previous) = from.map(K::phase_of).filter(|p| *p != phase) {
        if let Ok(data) = project.phase_mut(previous) {
            if !data.is(status::COMPLETED) {
                data.finish();
            }
        }
    }
    activate::<K>(state, project);
    K::on_enter(from, state, project);

    K::guidance(state, project)
}

fn activate<K: ProjectKind>(state: K::State, project: &mut Project) {
    let Ok(data) = project.phase_mut(K::phase_of(state)) else {
        return;
    };
    let target = K::phase_status(state);
    if target == status::COMPLETED {
        if !data.is(status::COMPLETED) {
            data.finish();
        }
    } else {
        data.start();
        data.status = target.to_string();
    }
}

/// State labels of a project type, for schema checks.
pub fn state_labels(project_type: ProjectType) -> Vec<String> {
    fn labels<K: ProjectKind>() -> Vec<String> {
        K::states().iter().map(|s| s.to_string()).collect()
    }
    match project_type {
        ProjectType::Standard => labels::<Standard>(),
        ProjectType::Exploration => labels::<Exploration>(),
        ProjectType::Design => labels::<Design>(),
        ProjectType::Breakdown => labels::<Breakdown>(),
    }
}

pub fn phase_specs(project_type: ProjectType) -> &'static [PhaseSpec] {
    match project_type {
        ProjectType::Standard => Standard::PHASES,
        ProjectType::Exploration => Exploration::PHASES,
        ProjectType::Design => Design::PHASES,
        ProjectType::Breakdown => Breakdown::PHASES,
    }
}
