use tracing::info;

use super::{Outcome, Workflow};
use crate::errors::{WorkflowError, WorkflowResult};
use crate::kinds::ProjectKind;
use crate::tracker::{IssueTracker, ISSUE_NUMBER};

/// Issues created by one `publish` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// `(task id, issue number, issue url)` in creation order.
    pub created: Vec<(String, u64, String)>,
    /// Tasks that already carried an issue from an earlier run.
    pub skipped: Vec<String>,
    /// Set once publishing finished the project.
    pub outcome: Option<Outcome>,
}

impl<K: ProjectKind> Workflow<K> {
    /// Create one issue per completed task in dependency order.
    ///
    /// Each created issue is persisted on its task before the next one is
    /// created, so a run that fails halfway can simply be repeated.
    pub fn publish(
        &mut self,
        tracker: &dyn IssueTracker,
        labels: &[String],
    ) -> WorkflowResult<PublishReport> {
        let order = K::operations(self.state()).publish_order(&self.project)?;
        let mut report = PublishReport::default();

        for task_id in order {
            let published = match self.project.find_task(&task_id) {
                Some((_, task)) => task.metadata.contains(ISSUE_NUMBER),
                None => false,
            };
            if published {
                report.skipped.push(task_id);
                continue;
            }

            let draft = K::operations(self.state()).issue_draft(&self.project, &task_id)?;
            let issue = tracker
                .create_issue(&draft.title, &draft.body, labels)
                .map_err(|e| WorkflowError::external(format!("create issue for task {task_id}"), e))?;
            info!(task = %task_id, number = issue.number, url = %issue.url, "issue created");

            let outcome = self.apply(|ops, project| {
                ops.record_issue(project, &task_id, issue.number, &issue.url)
            })?;
            report.created.push((task_id, issue.number, issue.url));
            if outcome.transition.is_some() {
                report.outcome = Some(outcome);
            }
        }

        // Everything was already published by an earlier run.
        if report.outcome.is_none() && report.created.is_empty() {
            report.outcome = Some(self.complete()?);
        }
        Ok(report)
    }
}
