//! Git repository operations

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use hangar_core::error::{GitError, Result};
use hangar_core::{CommandSpec, ProcessRunner};

use crate::types::ChangeSet;

/// Git repository driven through the system `git` binary
pub struct GitRepo<'a> {
    runner: &'a dyn ProcessRunner,
    root: PathBuf,
}

impl<'a> GitRepo<'a> {
    /// Use `root` as the work tree root without asking git
    pub fn open(runner: &'a dyn ProcessRunner, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    /// Find the work tree containing `start_path`
    #[instrument(skip(runner), fields(start_path = %start_path.display()))]
    pub fn discover(runner: &'a dyn ProcessRunner, start_path: &Path) -> Result<Self> {
        info!(start_path = %start_path.display(), "discovering git repository");
        let output = runner
            .run(
                &CommandSpec::new("git")
                    .args(["rev-parse", "--show-toplevel"])
                    .current_dir(start_path),
            )
            .map_err(|e| {
                debug!(error = %e, "git rev-parse could not run");
                GitError::NotARepository(start_path.to_path_buf())
            })?;

        let toplevel = output.stdout.trim();
        if !output.success() || toplevel.is_empty() {
            debug!(reason = %output.failure_reason(), "git rev-parse failed");
            return Err(GitError::NotARepository(start_path.to_path_buf()).into());
        }

        debug!(root = toplevel, "found work tree");
        Ok(Self::open(runner, toplevel))
    }

    /// Work tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files that differ between `head` and `base`
    pub fn changed_files(&self, head: &str, base: &str) -> Result<ChangeSet> {
        let diff_failed = |reason: String| GitError::DiffFailed {
            base: base.to_string(),
            head: head.to_string(),
            reason,
        };

        let output = self
            .runner
            .run(
                &CommandSpec::new("git")
                    .args(["diff", "--name-only", head, base])
                    .current_dir(&self.root),
            )
            .map_err(|e| diff_failed(e.to_string()))?;

        if !output.success() {
            return Err(diff_failed(output.failure_reason()).into());
        }

        Ok(ChangeSet::from_diff_output(&output.stdout))
    }
}
