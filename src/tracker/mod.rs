//! Issue tracker collaborator
//!
//! Publishing only needs one capability: create an issue and learn its
//! number and URL. Both are stored on the originating task as opaque
//! metadata.

mod gh;

pub use gh::GhIssueTracker;

use anyhow::Result;

/// Task metadata key holding the created issue's number.
pub const ISSUE_NUMBER: &str = "issue_number";
pub const ISSUE_URL: &str = "issue_url";

/// Title and body of an issue about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub number: u64,
    pub url: String,
}

pub trait IssueTracker {
    fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<CreatedIssue>;
}
