//! Change sets parsed from `git diff --name-status`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions that take part in regeneration
pub const TRACKED_EXTENSIONS: &[&str] = &["py", "cpp", "java", "js", "scala", "sas", "json", "csv"];

/// Status of one changed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    /// Rename or copy; never regenerated
    Renamed,
}

impl ChangeStatus {
    /// Parse the status column (`A`, `M`, `D`, `R100`, ...)
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(Self::Added),
            "M" => Some(Self::Modified),
            "D" => Some(Self::Deleted),
            c if c.starts_with('R') || c.starts_with('C') => Some(Self::Renamed),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
        };
        write!(f, "{s}")
    }
}

/// One changed file, relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: PathBuf,
    pub status: ChangeStatus,
}

impl ChangeEntry {
    /// Create new entry
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// Diff line that could not be turned into an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: String,
    pub reason: String,
}

/// Parsed diff summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub entries: Vec<ChangeEntry>,
    pub skipped: Vec<SkippedLine>,
}

/// Parse `git diff --name-status` output
///
/// Lines whose last field has an untracked extension are ignored. Tracked
/// lines must have exactly two tab-separated fields (`status\tpath`); anything
/// else, such as a three-field rename line, is skipped with a warning.
#[must_use]
pub fn parse_name_status(raw: &str) -> ChangeSet {
    let mut set = ChangeSet::default();

    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split('\t').collect();
        let Some(last) = fields.last() else {
            continue;
        };
        if !is_tracked(Path::new(last.trim())) {
            continue;
        }

        let [code, path] = fields.as_slice() else {
            skip(&mut set, line, format!("expected 2 fields, found {}", fields.len()));
            continue;
        };

        match ChangeStatus::from_code(code.trim()) {
            Some(status) => set.entries.push(ChangeEntry::new(path.trim(), status)),
            None => skip(&mut set, line, format!("unknown status `{}`", code.trim())),
        }
    }

    set
}

fn skip(set: &mut ChangeSet, line: &str, reason: String) {
    tracing::warn!(line, %reason, "skipping diff line");
    set.skipped.push(SkippedLine {
        line: line.to_string(),
        reason,
    });
}

/// Check if a path has a tracked extension
#[must_use]
pub fn is_tracked(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TRACKED_EXTENSIONS.contains(&ext))
}

/// Added or removed lines of a unified diff that start a function definition
///
/// Diagnostic only: `+def ...`, `-    async def ...` and the like.
#[must_use]
pub fn changed_function_lines(diff: &str) -> Vec<&str> {
    diff.lines()
        .filter(|line| !line.starts_with("+++") && !line.starts_with("---"))
        .filter(|line| {
            let Some(rest) = line.strip_prefix('+').or_else(|| line.strip_prefix('-')) else {
                return false;
            };
            let rest = rest.trim_start();
            rest.starts_with("def ") || rest.starts_with("async def ")
        })
        .collect()
}
