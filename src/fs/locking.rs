//! Workspace lock for safe concurrent invocations
//!
//! Mutating commands hold an `fs2` advisory lock on `.weft/weft.lock` for the
//! load, mutate and persist window. A second command fails fast instead of
//! silently overwriting the first one's write.
//!
//! Advisory locks are cooperative: only `weft` processes honour them.

use anyhow::{bail, Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive lock released on drop.
#[derive(Debug)]
pub struct WorkspaceLock {
    file: File,
    path: PathBuf,
}

impl WorkspaceLock {
    /// Take the lock without waiting.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            bail!(
                "another weft command is updating this project ({} is locked). Retry once it finishes",
                path.display()
            );
        }
        tracing::debug!(path = %path.display(), "workspace lock acquired");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), "failed to release workspace lock: {err}");
        }
    }
}
