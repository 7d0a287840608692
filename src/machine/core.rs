use std::collections::HashMap;

use crate::errors::{WorkflowError, WorkflowResult};

use super::{EntryHook, Label, Transition};

/// Result of a successful [`StateMachine::fire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transitioned<S, E> {
    pub from: S,
    pub event: E,
    pub to: S,
    /// Whatever the entry hook produced for the destination state.
    pub guidance: String,
}

pub struct StateMachine<S, E, C> {
    current: S,
    transitions: Vec<Transition<S, E, C>>,
    index: HashMap<(S, E), usize>,
    on_entry: Option<EntryHook<S, C>>,
}

impl<S: Label, E: Label, C> StateMachine<S, E, C> {
    pub(super) fn from_parts(
        initial: S,
        transitions: Vec<Transition<S, E, C>>,
        on_entry: Option<EntryHook<S, C>>,
    ) -> Self {
        let index = transitions
            .iter()
            .enumerate()
            .map(|(i, t)| ((t.from, t.event), i))
            .collect();
        Self {
            current: initial,
            transitions,
            index,
            on_entry,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Fire `event` against the current state.
    ///
    /// The state is only changed once the guard has passed, and the entry
    /// hook runs strictly after the change.
    pub fn fire(&mut self, event: E, ctx: &mut C) -> WorkflowResult<Transitioned<S, E>> {
        let from = self.current;
        let transition = self
            .index
            .get(&(from, event))
            .map(|&i| &self.transitions[i])
            .ok_or_else(|| WorkflowError::IllegalTransition {
                state: from.to_string(),
                event: event.to_string(),
            })?;

        if let Some(guard) = &transition.guard {
            guard
                .evaluate(ctx)
                .map_err(|reason| WorkflowError::GuardRejected {
                    state: from.to_string(),
                    event: event.to_string(),
                    reason,
                })?;
        }

        let to = transition.to;
        self.current = to;
        tracing::debug!(%from, %event, %to, "transition");

        let guidance = match &self.on_entry {
            Some(hook) => hook(to, ctx),
            None => String::new(),
        };

        Ok(Transitioned {
            from,
            event,
            to,
            guidance,
        })
    }

    /// Events that could be fired right now: a transition exists from the
    /// current state and its guard (if any) passes. Registration order.
    pub fn permitted_events(&self, ctx: &C) -> Vec<E> {
        self.transitions
            .iter()
            .filter(|t| t.from == self.current)
            .filter(|t| t.guard.as_ref().is_none_or(|g| g.allows(ctx)))
            .map(|t| t.event)
            .collect()
    }

    /// Every event registered from the current state with its guard verdict.
    pub fn candidate_events(&self, ctx: &C) -> Vec<(E, Result<(), String>)> {
        self.transitions
            .iter()
            .filter(|t| t.from == self.current)
            .map(|t| {
                let verdict = match &t.guard {
                    Some(guard) => guard.evaluate(ctx),
                    None => Ok(()),
                };
                (t.event, verdict)
            })
            .collect()
    }

    pub fn can_fire(&self, event: E, ctx: &C) -> bool {
        self.index
            .get(&(self.current, event))
            .map(|&i| &self.transitions[i])
            .is_some_and(|t| t.guard.as_ref().is_none_or(|g| g.allows(ctx)))
    }

    /// A state with no outgoing transitions.
    pub fn is_terminal(&self, state: S) -> bool {
        !self.transitions.iter().any(|t| t.from == state)
    }

    /// Put the machine back in `state` without running guards or hooks.
    ///
    /// Only used to roll back an in-memory transition whose persistence
    /// failed.
    pub(crate) fn restore(&mut self, state: S) {
        self.current = state;
    }
}

impl<S: Label, E: Label, C> std::fmt::Debug for StateMachine<S, E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("transitions", &self.transitions.len())
            .finish()
    }
}
