//! Commands that drive the current phase: fire, advance, complete, set,
//! enable and skip.

use anyhow::Result;

use super::common::{print_done, print_outcome, with_workflow};

pub fn fire(event: String) -> Result<()> {
    with_workflow(|wf| {
        print_outcome(&wf.fire_label(&event)?);
        Ok(())
    })
}

pub fn advance() -> Result<()> {
    with_workflow(|wf| {
        print_outcome(&wf.advance()?);
        Ok(())
    })
}

pub fn complete() -> Result<()> {
    with_workflow(|wf| {
        let phase = wf.active_phase();
        let outcome = wf.complete()?;
        print_done(&format!("Completed {phase}"));
        print_outcome(&outcome);
        Ok(())
    })
}

pub fn set(field: String, value: String, phase: Option<String>) -> Result<()> {
    with_workflow(|wf| {
        let target = phase.clone().unwrap_or_else(|| wf.active_phase().to_string());
        let outcome = wf.set(&field, &value, phase.as_deref())?;
        print_done(&format!("Set {target}.{field} = {value}"));
        print_outcome(&outcome);
        Ok(())
    })
}

pub fn enable(phase: String) -> Result<()> {
    with_workflow(|wf| {
        wf.enable_phase(&phase)?;
        print_done(&format!("Enabled the {phase} phase"));
        Ok(())
    })
}

pub fn skip(phase: String) -> Result<()> {
    with_workflow(|wf| {
        wf.skip_phase(&phase)?;
        print_done(&format!("Skipped the {phase} phase"));
        Ok(())
    })
}
