use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use weft::models::{ProjectType, TaskStatus};
use weft::validation::{
    clap_description_validator, clap_id_validator, clap_key_value_parser,
    clap_project_name_validator,
};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Resumable multi-phase project workflows", long_about = None)]
#[command(version)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    /// Run as if weft was started in DIR
    #[arg(short = 'C', global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a project in this working copy
    Init {
        /// Project type: standard, exploration, design or breakdown
        project_type: ProjectType,

        /// Project name (kebab-case)
        #[arg(value_parser = clap_project_name_validator)]
        name: String,

        /// Branch the work happens on (defaults to the current git branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// Short description of the project
        #[arg(short, long, value_parser = clap_description_validator)]
        description: Option<String>,
    },

    /// Show the project, its phases and the next step
    Status,

    /// List events from the current state and whether each could fire
    Events,

    /// Fire an event directly
    Fire {
        /// Event label (see 'weft events')
        event: String,
    },

    /// Move to the next step within the current phase
    Advance,

    /// Complete the current phase or step
    Complete,

    /// Re-enable a skipped optional phase
    Enable {
        /// Phase name
        phase: String,
    },

    /// Skip an optional phase that has not started
    Skip {
        /// Phase name
        phase: String,
    },

    /// Set a metadata field on the active phase
    ///
    /// Some fields are workflow signals, e.g. 'tasks_approved true' or
    /// 'pr_url <url>', and may move the project to its next state.
    Set {
        /// Field name
        field: String,

        /// Value (true/false and integers are typed, anything else is text)
        value: String,

        /// Write to this phase instead of the active one
        #[arg(long)]
        phase: Option<String>,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Manage artifacts
    Artifact {
        #[command(subcommand)]
        command: ArtifactCommands,
    },

    /// Spawn and resume agent sessions
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Create an issue per completed work unit (breakdown projects)
    Publish {
        /// Extra label for every created issue (can be repeated)
        #[arg(short, long = "label")]
        labels: Vec<String>,
    },

    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to the active phase
    Add {
        /// Task name
        name: String,

        /// Explicit task ID (defaults to the next gap-numbered ID)
        #[arg(long, value_parser = clap_id_validator)]
        id: Option<String>,

        /// Task description
        #[arg(short, long, value_parser = clap_description_validator)]
        description: Option<String>,

        /// Task IDs this task builds on (comma separated or repeated)
        #[arg(long = "depends-on", value_delimiter = ',', value_parser = clap_id_validator)]
        dependencies: Vec<String>,

        /// Hint that this task can run alongside its siblings
        #[arg(long)]
        parallel: bool,
    },

    /// Change a task's status
    Status {
        /// Task ID
        #[arg(value_parser = clap_id_validator)]
        id: String,

        /// pending, in_progress, needs_review, completed or abandoned
        status: TaskStatus,
    },

    /// List tasks
    List {
        /// Phase to list (defaults to the active phase)
        #[arg(long)]
        phase: Option<String>,
    },

    /// Show one task
    Show {
        /// Task ID
        #[arg(value_parser = clap_id_validator)]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ArtifactCommands {
    /// Track an artifact on the active phase
    Add {
        /// Path of the artifact, relative to the repository root
        path: String,

        /// Track as an input instead of an output
        #[arg(long)]
        input: bool,

        /// Artifact description
        #[arg(short, long, value_parser = clap_description_validator)]
        description: Option<String>,

        /// Task whose completion approves this output
        #[arg(long, value_parser = clap_id_validator)]
        task: Option<String>,

        /// Do not require approval for this output
        #[arg(long)]
        no_approval: bool,

        /// Metadata key=value pair (can be repeated)
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = clap_key_value_parser)]
        meta: Vec<(String, String)>,
    },

    /// Approve an output artifact
    Approve {
        /// Path of the artifact
        path: String,
    },

    /// List artifacts
    List {
        /// Phase to list (defaults to the active phase)
        #[arg(long)]
        phase: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// List agent roles, executors and recorded sessions
    List,

    /// Start an agent session, recording its ID before launch
    Spawn {
        /// Agent role (defaults to the role suggested for the current state)
        #[arg(short, long, value_parser = clap_id_validator)]
        role: Option<String>,

        /// Task the session works on
        #[arg(short, long, value_parser = clap_id_validator)]
        task: Option<String>,

        /// Executor to use (defaults to [executor] default)
        #[arg(short, long)]
        executor: Option<String>,
    },

    /// Resume a recorded session
    Resume {
        /// Agent role whose taskless session to resume
        #[arg(short, long, value_parser = clap_id_validator)]
        role: Option<String>,

        /// Task whose session to resume
        #[arg(short, long, value_parser = clap_id_validator, conflicts_with = "role")]
        task: Option<String>,

        /// Follow-up prompt
        #[arg(short, long)]
        prompt: Option<String>,

        /// Executor to use (defaults to [executor] default)
        #[arg(short, long)]
        executor: Option<String>,
    },
}
