//! Generated test artifacts
//!
//! A [`GeneratedArtifact`] is one generated test file together with how it
//! came to be. Degraded outputs are still written so a run always leaves a
//! file per code object; the status records what went wrong.

use crate::catalog::CodeObject;
use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Written in place of code when a reply carried no fenced block
pub const NO_CODE_PLACEHOLDER: &str = "# No code was generated for this object.\n";

/// Outcome of generating one artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Extracted code passed the syntax check
    Written,
    /// No fenced block in any reply; placeholder written
    ExtractionFailed,
    /// Code extracted but still invalid after all retries
    SyntaxInvalid,
}

impl ArtifactStatus {
    /// Check if the artifact is degraded
    #[inline]
    #[must_use]
    pub fn is_degraded(self) -> bool {
        !matches!(self, Self::Written)
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Written => "written",
            Self::ExtractionFailed => "extraction_failed",
            Self::SyntaxInvalid => "syntax_invalid",
        };
        write!(f, "{s}")
    }
}

/// One generated test file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Source file the object came from
    pub file_path: PathBuf,
    /// `Class.method` or `function`
    pub symbol: String,
    pub target_path: PathBuf,
    pub content: String,
    pub status: ArtifactStatus,
}

impl GeneratedArtifact {
    /// Artifact with validated code
    #[must_use]
    pub fn written(object: &CodeObject, target_path: PathBuf, code: String) -> Self {
        Self::build(object, target_path, code, ArtifactStatus::Written)
    }

    /// Artifact with code that failed the syntax check
    #[must_use]
    pub fn syntax_invalid(object: &CodeObject, target_path: PathBuf, code: String) -> Self {
        Self::build(object, target_path, code, ArtifactStatus::SyntaxInvalid)
    }

    /// Placeholder artifact for a reply without code
    #[must_use]
    pub fn extraction_failed(object: &CodeObject, target_path: PathBuf) -> Self {
        Self::build(
            object,
            target_path,
            NO_CODE_PLACEHOLDER.to_string(),
            ArtifactStatus::ExtractionFailed,
        )
    }

    fn build(
        object: &CodeObject,
        target_path: PathBuf,
        content: String,
        status: ArtifactStatus,
    ) -> Self {
        Self {
            file_path: object.file_path.clone(),
            symbol: object.qualified_name(),
            target_path,
            content,
            status,
        }
    }
}

/// All tests generated for one source file, in object order
#[derive(Debug, Clone)]
pub struct TestSuite {
    source: PathBuf,
    sections: Vec<(String, String)>,
}

impl TestSuite {
    /// Create empty suite for a source file
    #[must_use]
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            sections: Vec::new(),
        }
    }

    /// Append the tests of one object
    pub fn push(&mut self, object: &CodeObject, content: &str) {
        let header = match &object.class_name {
            Some(class) => format!("# --- {} in class {} ---", object.function_name, class),
            None => format!("# --- {} ---", object.function_name),
        };
        self.sections.push((header, content.trim_end().to_string()));
    }

    /// Number of sections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if suite has no sections
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render the aggregate file
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("# Generated tests for {}\n", self.source.display());
        for (header, content) in &self.sections {
            out.push('\n');
            out.push_str(header);
            out.push('\n');
            out.push_str(content);
            out.push('\n');
        }
        out
    }
}

/// Write `content` to `path`, creating parent directories
///
/// # Errors
/// Returns error if a directory or the file cannot be written
pub async fn write_artifact(path: &Path, content: &str) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ArtifactError::io_error(parent, e))?;
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| ArtifactError::io_error(path, e))?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "artifact written");
    Ok(())
}

/// Remove an artifact if it exists
///
/// Returns `true` if a file was removed.
///
/// # Errors
/// Returns error if the file exists but cannot be removed
pub async fn remove_artifact(path: &Path) -> Result<bool, ArtifactError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "artifact removed");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ArtifactError::io_error(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn object(class_name: Option<&str>, function_name: &str) -> CodeObject {
        CodeObject {
            file_path: PathBuf::from("shop/cart.py"),
            class_name: class_name.map(str::to_string),
            function_name: function_name.to_string(),
            source_text: String::new(),
        }
    }

    #[test]
    fn constructors_set_status() {
        let obj = object(Some("Cart"), "total");
        let target = PathBuf::from("out/test_Cart_total.py");

        let ok = GeneratedArtifact::written(&obj, target.clone(), "def test_a():\n    pass".into());
        assert_eq!(ok.status, ArtifactStatus::Written);
        assert_eq!(ok.symbol, "Cart.total");

        let missing = GeneratedArtifact::extraction_failed(&obj, target);
        assert_eq!(missing.content, NO_CODE_PLACEHOLDER);
        assert!(missing.status.is_degraded());
        assert_eq!(missing.status.to_string(), "extraction_failed");
    }

    #[test]
    fn suite_renders_headers_in_order() {
        let mut suite = TestSuite::new("shop/cart.py");
        suite.push(&object(Some("Cart"), "total"), "def test_total():\n    pass\n\n");
        suite.push(&object(None, "tax"), "def test_tax():\n    pass");

        assert_eq!(
            suite.render(),
            "\
# Generated tests for shop/cart.py

# --- total in class Cart ---
def test_total():
    pass

# --- tax ---
def test_tax():
    pass
"
        );
        assert_eq!(suite.len(), 2);
    }

    #[tokio::test]
    async fn write_creates_parents_and_remove_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/test_mod.py");

        write_artifact(&path, "x = 1\n").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "x = 1\n");

        assert!(remove_artifact(&path).await.unwrap());
        assert!(!remove_artifact(&path).await.unwrap());
        assert!(!path.exists());
    }
}
