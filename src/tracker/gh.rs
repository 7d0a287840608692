//! GitHub issues through the `gh` CLI

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::PathBuf;
use std::process::{Command, Output};

use super::{CreatedIssue, IssueTracker};

#[derive(Debug, Clone)]
pub struct GhIssueTracker {
    binary: String,
    /// `owner/name`; defaults to the repository of the working directory.
    repo: Option<String>,
    working_dir: Option<PathBuf>,
}

impl GhIssueTracker {
    pub fn new(binary: impl Into<String>, repo: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            repo,
            working_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Fail early with an actionable message when `gh` is not installed.
    pub fn check_available(&self) -> Result<()> {
        if which::which(&self.binary).is_err() {
            bail!(
                "'{}' not found on PATH. Install the GitHub CLI (https://cli.github.com) or set [tracker] gh_binary",
                self.binary
            );
        }
        Ok(())
    }

    fn run(&self, args: &[String]) -> Result<Output> {
        let mut command = Command::new(&self.binary);
        command.args(args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
            .output()
            .with_context(|| format!("Failed to execute: {} {}", self.binary, args.join(" ")))
    }
}

impl IssueTracker for GhIssueTracker {
    fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<CreatedIssue> {
        let mut args = vec![
            "issue".to_string(),
            "create".to_string(),
            "--title".to_string(),
            title.to_string(),
            "--body".to_string(),
            body.to_string(),
        ];
        for label in labels {
            args.push("--label".to_string());
            args.push(label.clone());
        }
        if let Some(repo) = &self.repo {
            args.push("--repo".to_string());
            args.push(repo.clone());
        }

        let output = self.run(&args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("gh issue create failed: {}", stderr.trim());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let issue = parse_issue_url(&stdout)?;
        tracing::info!(number = issue.number, url = %issue.url, "issue created");
        Ok(issue)
    }
}

/// `gh issue create` prints the new issue's URL as its last line.
pub(crate) fn parse_issue_url(stdout: &str) -> Result<CreatedIssue> {
    let url = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .context("gh issue create printed nothing")?;

    let re = Regex::new(r"/issues/(\d+)/?$").context("Invalid issue URL pattern")?;
    let number = re
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .with_context(|| format!("Could not find an issue number in '{url}'"))?;

    Ok(CreatedIssue {
        number,
        url: url.to_string(),
    })
}
