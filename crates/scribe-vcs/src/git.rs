//! Version-control access

use crate::error::VcsError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Default diff range: local commits not yet pushed
pub const DEFAULT_RANGE: &str = "@{upstream}..HEAD";

/// Source of diffs for the dispatcher
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Raw `status\tpath` lines for the configured range
    ///
    /// # Errors
    /// Returns error if the underlying command fails
    async fn name_status(&self) -> Result<String, VcsError>;

    /// Unified diff of one file for the configured range
    ///
    /// # Errors
    /// Returns error if the underlying command fails
    async fn file_diff(&self, path: &Path) -> Result<String, VcsError>;
}

/// `git` command-line client
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    range: String,
}

impl GitCli {
    /// Client for the repository at `workdir`
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            range: DEFAULT_RANGE.to_string(),
        }
    }

    /// Set diff range
    #[must_use]
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    async fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!(%command, workdir = %self.workdir.display(), "running");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| VcsError::io_error(&command, e))?;

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| VcsError::Utf8 { command })
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn name_status(&self) -> Result<String, VcsError> {
        self.run(&["diff", "--name-status", &self.range]).await
    }

    async fn file_diff(&self, path: &Path) -> Result<String, VcsError> {
        let path = path.to_string_lossy();
        self.run(&["diff", &self.range, "--", &path]).await
    }
}
