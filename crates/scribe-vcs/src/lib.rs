//! Scribe Version Control
//!
//! Turns a version-control diff into a [`ChangeSet`] the dispatcher acts on.
//!
//! - [`parse_name_status`]: `status\tpath` lines → [`ChangeEntry`] values,
//!   filtered to tracked extensions, malformed lines skipped
//! - [`changed_function_lines`]: function-definition lines in a file diff
//! - [`VersionControl`]: async seam over the diff source, [`GitCli`] by default

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod change;
mod error;
mod git;

pub use change::{
    changed_function_lines, is_tracked, parse_name_status, ChangeEntry, ChangeSet, ChangeStatus,
    SkippedLine, TRACKED_EXTENSIONS,
};
pub use error::VcsError;
pub use git::{GitCli, VersionControl, DEFAULT_RANGE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
