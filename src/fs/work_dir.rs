use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The `.weft/` directory at the repository root.
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            root: base_path.as_ref().join(".weft"),
        }
    }

    /// Walk up from `start` looking for an existing `.weft/` directory.
    pub fn discover<P: AsRef<Path>>(start: P) -> Option<Self> {
        start
            .as_ref()
            .ancestors()
            .map(Self::new)
            .find(|dir| dir.root.is_dir())
    }

    /// Create `.weft/` if needed. Existing content is left alone.
    pub fn ensure(&self) -> Result<()> {
        if self.root.exists() && !self.root.is_dir() {
            bail!("{} exists and is not a directory", self.root.display());
        }
        fs::create_dir_all(&self.root).context("Failed to create .weft directory")?;

        let readme = self.root.join("README.md");
        if !readme.exists() {
            fs::write(&readme, README).context("Failed to create README.md")?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything that belongs to the active project.
    /// Deleted when the project reaches its terminal state.
    pub fn project_dir(&self) -> PathBuf {
        self.root.join("project")
    }

    pub fn state_path(&self) -> PathBuf {
        self.project_dir().join("state.yaml")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("weft.lock")
    }

    /// Repository root (parent of `.weft`)
    pub fn repo_root(&self) -> Option<&Path> {
        self.root.parent()
    }
}

const README: &str = r#"# weft Work Directory

This directory is managed by the weft CLI and contains:

- `project/state.yaml` - state of the active project (phases, tasks, artifacts, sessions)
- `config.toml` - optional repository configuration
- `weft.lock` - advisory lock held while a command updates the project

The `project/` directory is removed when the project completes.
Do not manually edit these files unless you know what you're doing.
"#;
