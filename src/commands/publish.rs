//! `weft publish`: create one issue per completed work unit

use anyhow::Result;
use colored::Colorize;

use super::common::{print_done, print_outcome, Context};
use crate::tracker::GhIssueTracker;

pub fn execute(labels: Vec<String>) -> Result<()> {
    let ctx = Context::discover()?;
    let tracker = GhIssueTracker::new(
        ctx.config.tracker.gh_binary.clone(),
        ctx.config.tracker.repo.clone(),
    )
    .in_dir(ctx.repo_root());
    tracker.check_available()?;

    let mut all_labels = ctx.config.tracker.labels.clone();
    for label in labels {
        if !all_labels.contains(&label) {
            all_labels.push(label);
        }
    }
    ctx.with_workflow(|wf| {
        let report = wf.publish(&tracker, &all_labels)?;
        for task in &report.skipped {
            println!("  {} task {task} already published", "·".dimmed());
        }
        for (task, number, url) in &report.created {
            print_done(&format!("task {task} → #{number} {}", url.dimmed()));
        }
        if let Some(outcome) = &report.outcome {
            print_outcome(outcome);
        }
        Ok(())
    })
}
