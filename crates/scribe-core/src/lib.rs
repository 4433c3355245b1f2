//! Scribe Core - model-driven test and documentation generation
//!
//! The pieces between a cataloged Python tree and the files written from it:
//! - [`extract_code`] pulls fenced Python out of a model reply
//! - [`generate_validated`] retries a model call until its code parses
//! - [`ConversationSession`] keeps each thread's bounded history
//! - [`GenerationPipeline`] runs both threads over every code object
//! - [`ChangeDispatcher`] turns a diff into regeneration and cleanup
//!
//! # Example
//!
//! ```rust,ignore
//! use scribe_artifact::{CodeCatalog, PythonCatalog};
//! use scribe_core::{ChatCompletionsClient, GenerationPipeline, ScribeConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScribeConfig::load("scribe.toml".as_ref())?;
//! let catalog = PythonCatalog::new().catalog_directory("src".as_ref())?;
//! let model = ChatCompletionsClient::from_config(config.model.clone())?;
//!
//! let mut pipeline = GenerationPipeline::new(model, PythonCatalog::new(), &config, &catalog.summary);
//! let report = pipeline.run(&catalog).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod generation;
pub mod model;
pub mod pipeline;
pub mod prompts;

// Re-exports for convenience
pub use config::{ApiFlavor, GenerationConfig, ModelConfig, ModelParams, ScribeConfig};
pub use conversation::{ConversationSession, Message, Role, WINDOW_TAIL};
pub use dispatch::{ChangeDispatcher, DispatchReport, FileRegenerator};
pub use error::{ConfigError, ModelError, ScribeError, ScribeResult};
pub use extract::extract_code;
pub use generation::{generate_validated, Generation, GenerationOutcome, RetryBudget};
pub use model::{ChatCompletionsClient, CompletionRequest, ModelService};
pub use pipeline::{
    ArtifactRecord, FileReport, GenerationPipeline, RunReport, SpliceRecord, SpliceResult,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
