//! Symbol paths and generated-artifact paths
//!
//! [`SymbolPath`] names a code object inside a module (`function` or
//! `Class.method`). The free functions map a source file path to the path of
//! its generated test file and back.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Prefix inserted in front of the final path segment
pub const TEST_PREFIX: &str = "test_";

/// Path of the generated test file for a source file
///
/// Inserts [`TEST_PREFIX`] right after the last `/` or `\` separator, leaving
/// every earlier separator untouched. A bare filename is treated as a single
/// segment and simply prefixed.
///
/// # Examples
/// - `dir/sub/module.py` → `dir/sub/test_module.py`
/// - `module.py` → `test_module.py`
/// - `dir\module.py` → `dir\test_module.py`
///
/// The mapping is not idempotent: mapping `test_module.py` again yields
/// `test_test_module.py`.
#[must_use]
pub fn artifact_path(source: &str) -> String {
    match last_separator(source) {
        Some(idx) => {
            let (dir, file) = source.split_at(idx + 1);
            format!("{dir}{TEST_PREFIX}{file}")
        }
        None => format!("{TEST_PREFIX}{source}"),
    }
}

/// [`artifact_path`] for filesystem paths
#[must_use]
pub fn artifact_path_buf(source: &Path) -> PathBuf {
    PathBuf::from(artifact_path(&source.to_string_lossy()))
}

/// Inverse of [`artifact_path`]
///
/// Returns `None` if the final segment does not carry [`TEST_PREFIX`].
#[must_use]
pub fn source_path(artifact: &str) -> Option<String> {
    let (dir, file) = match last_separator(artifact) {
        Some(idx) => artifact.split_at(idx + 1),
        None => ("", artifact),
    };
    file.strip_prefix(TEST_PREFIX)
        .map(|original| format!("{dir}{original}"))
}

/// Per-object test file under `root`: `test_{class}_{function}.py` or
/// `test_{function}.py`
#[must_use]
pub fn unit_test_file(root: &Path, symbol: &SymbolPath) -> PathBuf {
    root.join(format!("{TEST_PREFIX}{}.py", symbol.join("_")))
}

fn last_separator(path: &str) -> Option<usize> {
    path.rfind(|c| c == '/' || c == '\\')
}

/// Path of a code object within a module
///
/// # Examples
/// - `["parse"]` → `parse`
/// - `["Store", "__init__"]` → `Store.__init__`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolPath(Vec<String>);

impl SymbolPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Path for a function, optionally owned by a class
    #[must_use]
    pub fn for_object(class_name: Option<&str>, function_name: &str) -> Self {
        match class_name {
            Some(class) => Self(vec![class.to_string(), function_name.to_string()]),
            None => Self::single(function_name),
        }
    }

    /// Last segment (the function name)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Owning class segment, if the path has two or more segments
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        if self.0.len() >= 2 {
            self.0.first().map(String::as_str)
        } else {
            None
        }
    }

    /// Join segments with custom separator
    #[inline]
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

impl Display for SymbolPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}
