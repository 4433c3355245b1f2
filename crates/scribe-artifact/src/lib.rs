//! Scribe Artifact System
//!
//! Everything the generation pipeline needs to know about source files and
//! the files it produces from them.
//!
//! # Core Concepts
//!
//! - [`CodeObject`]: one function or method with its verbatim source text
//! - [`PythonCatalog`]: walks a directory and yields code objects plus a
//!   [`DirectorySummary`] used as prompt context
//! - [`GeneratedArtifact`]: a generated test file and its [`ArtifactStatus`]
//! - [`artifact_path`]: deterministic `dir/module.py` → `dir/test_module.py`
//! - [`splice_documentation`]: syntax-tree based replacement of one definition
//!
//! # Example
//!
//! ```rust,ignore
//! use scribe_artifact::{artifact_path, PythonCatalog, CodeCatalog};
//!
//! let catalog = PythonCatalog::new().catalog_directory("src".as_ref())?;
//! for file in &catalog.files {
//!     println!("{} -> {}", file.path.display(), artifact_path(&file.path.to_string_lossy()));
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod artifact;
mod catalog;
mod error;
mod path;
mod splice;
mod syntax;

// Re-exports
pub use artifact::{
    remove_artifact, write_artifact, ArtifactStatus, GeneratedArtifact, TestSuite,
    NO_CODE_PLACEHOLDER,
};
pub use catalog::{
    Catalog, CodeCatalog, CodeObject, DirectorySummary, FileCatalog, FileSummary, PythonCatalog,
};
pub use error::{ArtifactError, CatalogError, SpliceError};
pub use path::{
    artifact_path, artifact_path_buf, source_path, unit_test_file, SymbolPath, TEST_PREFIX,
};
pub use splice::{prepare_replacement, splice_documentation, splice_file};
pub use syntax::{check_python, parse_python, python_definitions, Definition, SyntaxError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
