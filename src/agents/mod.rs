//! Agents
//!
//! - [`registry`]: the roles an agent can be spawned as
//! - [`executor`]: backends that run an agent process
//! - [`session`]: the spawn/resume protocol that makes sessions survive crashes

pub mod executor;
pub mod registry;
pub mod session;

#[cfg(test)]
mod tests;

pub use executor::{AgentExecutor, ClaudeExecutor, CommandExecutor, ExecutorKind, ExecutorRegistry};
pub use registry::{AgentRegistry, AgentRole};
pub use session::{SessionKey, SessionLedger, SessionManager};
