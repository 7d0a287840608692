pub mod artifact;
pub mod metadata;
pub mod phase;
pub mod project;
pub mod task;

pub use artifact::{Approval, Artifact, ArtifactKind};
pub use metadata::Metadata;
pub use phase::Phase;
pub use project::{Project, ProjectType};
pub use task::{next_task_id, Task, TaskStatus};
