//! Change-driven dispatch
//!
//! Reads the change set for the configured range and acts per entry:
//!
//! | Status              | Action                                        |
//! |---------------------|-----------------------------------------------|
//! | `Deleted`           | remove the mapped artifact, no generation     |
//! | `Added`/`Modified`  | regenerate that one file                      |
//! | `Renamed`           | skip                                          |
//!
//! Function-definition lines of each regenerated file's diff are logged.
//! They do not narrow what gets regenerated.

use crate::error::ScribeResult;
use crate::model::ModelService;
use crate::pipeline::{FileReport, GenerationPipeline};
use async_trait::async_trait;
use scribe_artifact::{artifact_path_buf, remove_artifact, CodeCatalog};
use scribe_vcs::{
    changed_function_lines, parse_name_status, ChangeEntry, ChangeStatus, SkippedLine,
    VersionControl,
};
use std::fmt;
use std::path::{Path, PathBuf};

/// Anything that can regenerate the outputs of one source file
#[async_trait]
pub trait FileRegenerator: Send {
    /// Regenerate outputs for `path`
    ///
    /// # Errors
    /// Returns error if regeneration fails fatally
    async fn regenerate_file(&mut self, path: &Path) -> ScribeResult<FileReport>;
}

#[async_trait]
impl<M, C> FileRegenerator for GenerationPipeline<M, C>
where
    M: ModelService,
    C: CodeCatalog,
{
    async fn regenerate_file(&mut self, path: &Path) -> ScribeResult<FileReport> {
        self.regenerate(path).await
    }
}

/// Maps a change set onto regeneration and artifact removal
#[derive(Debug, Clone)]
pub struct ChangeDispatcher<V> {
    vcs: V,
    repo_root: PathBuf,
}

impl<V: VersionControl> ChangeDispatcher<V> {
    /// Create dispatcher; change paths are resolved against `repo_root`
    #[must_use]
    pub fn new(vcs: V, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            repo_root: repo_root.into(),
        }
    }

    /// Apply the current change set
    ///
    /// # Errors
    /// Returns the first version-control, IO or regeneration error
    pub async fn dispatch<R>(&self, regenerator: &mut R) -> ScribeResult<DispatchReport>
    where
        R: FileRegenerator + ?Sized,
    {
        let raw = self.vcs.name_status().await?;
        let changes = parse_name_status(&raw);
        tracing::info!(
            entries = changes.entries.len(),
            skipped = changes.skipped.len(),
            "change set loaded"
        );

        let mut report = DispatchReport {
            skipped_lines: changes.skipped,
            ..DispatchReport::default()
        };

        for entry in changes.entries {
            let path = self.repo_root.join(&entry.path);
            let status = entry.status;
            match status {
                ChangeStatus::Deleted => {
                    let artifact = artifact_path_buf(&path);
                    if remove_artifact(&artifact).await? {
                        tracing::info!(artifact = %artifact.display(), "removed artifact of deleted file");
                        report.removed.push(artifact);
                    } else {
                        tracing::debug!(artifact = %artifact.display(), "deleted file had no artifact");
                    }
                }
                ChangeStatus::Added | ChangeStatus::Modified => {
                    self.log_changed_functions(&entry.path).await?;
                    tracing::info!(path = %path.display(), %status, "regenerating");
                    report.regenerated.push(regenerator.regenerate_file(&path).await?);
                }
                ChangeStatus::Renamed => {
                    tracing::warn!(path = %entry.path.display(), "skipping renamed file");
                    report.skipped_entries.push(entry);
                }
            }
        }

        Ok(report)
    }

    async fn log_changed_functions(&self, relative: &Path) -> ScribeResult<()> {
        let diff = self.vcs.file_diff(relative).await?;
        for line in changed_function_lines(&diff) {
            tracing::info!(path = %relative.display(), line, "changed function");
        }
        Ok(())
    }
}

/// Outcome of one dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub regenerated: Vec<FileReport>,
    /// Artifacts removed for deleted sources
    pub removed: Vec<PathBuf>,
    /// Entries that were not acted on
    pub skipped_entries: Vec<ChangeEntry>,
    /// Diff lines that could not be parsed
    pub skipped_lines: Vec<SkippedLine>,
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.regenerated {
            write!(f, "{file}")?;
        }
        for removed in &self.removed {
            writeln!(f, "removed {}", removed.display())?;
        }
        write!(
            f,
            "{} files regenerated, {} artifacts removed, {} entries skipped, {} diff lines skipped",
            self.regenerated.len(),
            self.removed.len(),
            self.skipped_entries.len(),
            self.skipped_lines.len()
        )
    }
}
