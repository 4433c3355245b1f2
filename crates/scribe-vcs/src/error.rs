//! Error types for version-control access

/// Version-control error
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Command ran but exited unsuccessfully
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Command could not be spawned
    #[error("failed to run `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command output was not UTF-8
    #[error("`{command}` produced non-UTF-8 output")]
    Utf8 { command: String },
}

impl VcsError {
    /// Create spawn error for command
    pub fn io_error(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            command: command.into(),
            source,
        }
    }
}
