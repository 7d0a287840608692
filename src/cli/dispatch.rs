use anyhow::Result;
use clap::CommandFactory;
use clap_complete::generate;
use weft::commands::artifact::AddArtifact;
use weft::commands::{agent, artifact, init, phase, publish, status, task};

use super::types::{AgentCommands, ArtifactCommands, Cli, Commands, TaskCommands};

pub fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Init {
            project_type,
            name,
            branch,
            description,
        } => init::execute(project_type, name, branch, description),
        Commands::Status => status::execute(),
        Commands::Events => status::events(),
        Commands::Fire { event } => phase::fire(event),
        Commands::Advance => phase::advance(),
        Commands::Complete => phase::complete(),
        Commands::Enable { phase: name } => phase::enable(name),
        Commands::Skip { phase: name } => phase::skip(name),
        Commands::Set {
            field,
            value,
            phase: target,
        } => phase::set(field, value, target),
        Commands::Task { command } => match command {
            TaskCommands::Add {
                name,
                id,
                description,
                dependencies,
                parallel,
            } => task::add(name, id, description, dependencies, parallel),
            TaskCommands::Status { id, status } => task::status(id, status),
            TaskCommands::List { phase } => task::list(phase),
            TaskCommands::Show { id } => task::show(id),
        },
        Commands::Artifact { command } => match command {
            ArtifactCommands::Add {
                path,
                input,
                description,
                task,
                no_approval,
                meta,
            } => artifact::add(AddArtifact {
                path,
                input,
                description,
                task,
                approval: !no_approval,
                meta,
            }),
            ArtifactCommands::Approve { path } => artifact::approve(path),
            ArtifactCommands::List { phase } => artifact::list(phase),
        },
        Commands::Agent { command } => match command {
            AgentCommands::List => agent::list(),
            AgentCommands::Spawn {
                role,
                task,
                executor,
            } => agent::spawn(role, task, executor),
            AgentCommands::Resume {
                role,
                task,
                prompt,
                executor,
            } => agent::resume(role, task, prompt, executor),
        },
        Commands::Publish { labels } => publish::execute(labels),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "weft", &mut std::io::stdout());
            Ok(())
        }
    }
}
