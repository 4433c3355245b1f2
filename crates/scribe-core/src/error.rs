//! Error types for Scribe Core
//!
//! Provides error handling for:
//! - Model service failures (transport, API status, empty replies)
//! - Configuration loading
//! - Collaborator failures surfaced by the pipeline and dispatcher
//!
//! Splice mismatches are the only recoverable class; the pipeline records
//! them and moves on. Everything else ends the run.

use scribe_artifact::{ArtifactError, CatalogError, SpliceError};
use scribe_vcs::VcsError;
use std::path::PathBuf;

/// Main Scribe error type
#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    /// Model service failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Version control failed
    #[error("version control error: {0}")]
    Vcs(#[from] VcsError),

    /// Cataloging failed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Splicing failed
    #[error("splice error: {0}")]
    Splice(#[from] SpliceError),

    /// Artifact write or removal failed
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ScribeError {
    /// Check if the error should end the run
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Splice(err) => !err.is_recoverable(),
            _ => true,
        }
    }
}

/// Result type alias for Scribe operations
pub type ScribeResult<T> = Result<T, ScribeError>;

/// Model service error
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Response carried no choices
    #[error("response contained no choices")]
    EmptyResponse,

    /// API key variable not set
    #[error("environment variable {0} is not set")]
    MissingApiKey(String),
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the config schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
