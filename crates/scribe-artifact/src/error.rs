//! Error types for the artifact layer
//!
//! - Catalog operations (directory → code objects)
//! - Documentation splices (generated text → source file)
//! - Artifact writes and removals

use crate::path::SymbolPath;
use crate::syntax::SyntaxError;
use std::path::PathBuf;

/// Errors while cataloging source files
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// IO error during file read or directory walk
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Parser could not be set up
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
}

impl CatalogError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while splicing generated documentation into a source file
#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    /// No definition with this symbol exists in the live file
    #[error("definition not found: {0}")]
    TargetNotFound(SymbolPath),

    /// The definition exists but no longer matches the captured source
    #[error("source of {0} changed since it was cataloged")]
    SourceDrift(SymbolPath),

    /// Substituting the replacement would leave the file unparsable
    #[error("spliced source for {target} is invalid: {error}")]
    InvalidResult {
        target: SymbolPath,
        #[source]
        error: SyntaxError,
    },

    /// Parser could not be set up
    #[error("parse error: {0}")]
    Parse(#[from] SyntaxError),

    /// IO error reading or writing the source file
    #[error("io error splicing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpliceError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the run can continue past this error
    ///
    /// Mismatches leave the file untouched; IO and parser setup failures do not.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TargetNotFound(_) | Self::SourceDrift(_) | Self::InvalidResult { .. }
        )
    }
}

/// Errors writing or removing generated artifacts
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// IO error during write or removal
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
