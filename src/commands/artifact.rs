//! `weft artifact`: inputs and outputs of the active phase

use anyhow::Result;
use colored::Colorize;

use super::common::{print_done, print_outcome, with_workflow, Context};
use crate::models::{Approval, Artifact, ArtifactKind};

pub struct AddArtifact {
    pub path: String,
    pub input: bool,
    pub description: Option<String>,
    pub task: Option<String>,
    /// Outputs require approval unless this is false.
    pub approval: bool,
    pub meta: Vec<(String, String)>,
}

pub fn add(args: AddArtifact) -> Result<()> {
    let kind = if args.input {
        ArtifactKind::Input
    } else {
        ArtifactKind::Output
    };
    let mut artifact = Artifact::new(args.path.clone())
        .with_description(args.description)
        .linked_to(args.task);
    if kind == ArtifactKind::Output && args.approval {
        artifact = artifact.requiring_approval();
    }
    for (key, value) in &args.meta {
        artifact.metadata.set_parsed(key.as_str(), value);
    }

    with_workflow(|wf| {
        let phase = wf.active_phase();
        let outcome = wf.add_artifact(artifact, kind)?;
        print_done(&format!("Tracked {kind} {} in {phase}", args.path.bold()));
        print_outcome(&outcome);
        Ok(())
    })
}

pub fn approve(path: String) -> Result<()> {
    with_workflow(|wf| {
        let outcome = wf.approve_artifact(&path)?;
        print_done(&format!("Approved {}", path.bold()));
        print_outcome(&outcome);
        Ok(())
    })
}

pub fn list(phase: Option<String>) -> Result<()> {
    let ctx = Context::discover()?;
    let workflow = ctx.open()?;
    let name = phase.as_deref().unwrap_or(workflow.active_phase());
    let data = workflow.project().phase(name)?;

    for kind in [ArtifactKind::Input, ArtifactKind::Output] {
        let artifacts = data.artifacts(kind);
        println!("{} {}", format!("{kind}s").bold(), format!("({name})").dimmed());
        if artifacts.is_empty() {
            println!("  (none)");
            continue;
        }
        for artifact in artifacts {
            let approval = match artifact.approved {
                Approval::Approved => "approved".green(),
                Approval::Pending => "pending".yellow(),
                Approval::NotRequired => "no approval needed".dimmed(),
            };
            let task = artifact
                .task_id
                .as_deref()
                .map(|t| format!(" task {t}"))
                .unwrap_or_default();
            println!("  {} {approval}{}", artifact.path, task.dimmed());
            if let Some(description) = &artifact.description {
                println!("    {}", description.dimmed());
            }
        }
    }
    Ok(())
}
