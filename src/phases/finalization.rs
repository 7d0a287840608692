//! Closing phase shared by project types that end with a wrap-up step

use super::{ensure_not_completed, guards, require, OpResult, PhaseOperations};
use crate::models::Project;

pub const FINALIZATION: &str = "finalization";

/// Completes once nothing produced during wrap-up is waiting for approval.
pub struct Finalization<E> {
    finished: E,
}

impl<E> Finalization<E> {
    pub fn new(finished: E) -> Self {
        Self { finished }
    }
}

impl<E: Copy> PhaseOperations for Finalization<E> {
    type Event = E;

    fn name(&self) -> &'static str {
        FINALIZATION
    }

    fn complete(&self, project: &mut Project) -> OpResult<E> {
        ensure_not_completed(project, FINALIZATION)?;
        require(
            guards::no_pending_outputs(project, FINALIZATION),
            "complete finalization",
        )?;
        project.phase_mut(FINALIZATION)?.finish();
        Ok(Some(self.finished))
    }
}
