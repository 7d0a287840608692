//! Generic guarded state machine
//!
//! A machine is declared with [`MachineBuilder`] and driven with
//! [`StateMachine::fire`]. States and events are opaque labels supplied by
//! each project type; guards and the entry hook receive the workflow context
//! explicitly instead of capturing it.
//!
//! Firing order:
//! 1. look up `(current, event)`, else `IllegalTransition`
//! 2. evaluate the guard, else `GuardRejected` (state unchanged)
//! 3. move to the destination state
//! 4. run the entry hook for the destination state

mod builder;
mod core;
mod guard;


use std::fmt::{Debug, Display};
use std::hash::Hash;

pub use builder::MachineBuilder;
pub use core::{StateMachine, Transitioned};
pub use guard::Guard;

/// Anything usable as a state or event token.
pub trait Label: Copy + Eq + Hash + Debug + Display + 'static {}

impl<T> Label for T where T: Copy + Eq + Hash + Debug + Display + 'static {}

/// Hook invoked after every successful transition with the destination state.
pub type EntryHook<S, C> = Box<dyn Fn(S, &mut C) -> String>;

pub(crate) struct Transition<S, E, C> {
    pub from: S,
    pub event: E,
    pub to: S,
    pub guard: Option<Guard<C>>,
}
