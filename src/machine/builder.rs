//! Fluent construction of state machines

use std::collections::HashSet;

use crate::errors::{WorkflowError, WorkflowResult};

use super::core::StateMachine;
use super::guard::Guard;
use super::{EntryHook, Label, Transition};

/// Accumulates transitions and materializes an immutable table.
///
/// ```
/// use weft::machine::{Guard, MachineBuilder};
///
/// let mut machine = MachineBuilder::<&str, &str, u32>::new()
///     .add_transition("draft", "review", "submit")
///     .add_guarded_transition(
///         "review",
///         "done",
///         "approve",
///         Guard::predicate("needs two approvals", |approvals: &u32| *approvals >= 2),
///     )
///     .build("draft")
///     .unwrap();
///
/// let mut approvals = 1;
/// machine.fire("submit", &mut approvals).unwrap();
/// assert!(machine.fire("approve", &mut approvals).is_err());
/// approvals = 2;
/// machine.fire("approve", &mut approvals).unwrap();
/// assert_eq!(machine.current(), "done");
/// ```
pub struct MachineBuilder<S, E, C> {
    transitions: Vec<Transition<S, E, C>>,
    on_entry: Option<EntryHook<S, C>>,
}

impl<S: Label, E: Label, C> Default for MachineBuilder<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Label, E: Label, C> MachineBuilder<S, E, C> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            on_entry: None,
        }
    }

    pub fn add_transition(mut self, from: S, to: S, event: E) -> Self {
        self.transitions.push(Transition {
            from,
            event,
            to,
            guard: None,
        });
        self
    }

    pub fn add_guarded_transition(mut self, from: S, to: S, event: E, guard: Guard<C>) -> Self {
        self.transitions.push(Transition {
            from,
            event,
            to,
            guard: Some(guard),
        });
        self
    }

    /// Register the hook run after every successful transition.
    pub fn on_entry<F>(mut self, hook: F) -> Self
    where
        F: Fn(S, &mut C) -> String + 'static,
    {
        self.on_entry = Some(Box::new(hook));
        self
    }

    /// Build the machine starting in `initial` (normally the persisted state).
    ///
    /// Fails if the same `(from, event)` pair was registered twice, or if
    /// `initial` does not appear anywhere in the table.
    pub fn build(self, initial: S) -> WorkflowResult<StateMachine<S, E, C>> {
        let mut seen = HashSet::new();
        for transition in &self.transitions {
            if !seen.insert((transition.from, transition.event)) {
                return Err(WorkflowError::AmbiguousTransition {
                    state: transition.from.to_string(),
                    event: transition.event.to_string(),
                });
            }
        }

        let known = self
            .transitions
            .iter()
            .any(|t| t.from == initial || t.to == initial);
        if !known {
            return Err(WorkflowError::validation(format!(
                "initial state '{initial}' is not part of the transition table"
            )));
        }

        Ok(StateMachine::from_parts(
            initial,
            self.transitions,
            self.on_entry,
        ))
    }
}
