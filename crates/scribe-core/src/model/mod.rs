//! Model service seam
//!
//! The pipeline only ever talks to a [`ModelService`]; the HTTP client lives
//! in [`openai`] and tests substitute scripted stubs.

pub mod openai;

use crate::config::ModelParams;
use crate::conversation::Message;
use crate::error::ModelError;
use async_trait::async_trait;

pub use openai::ChatCompletionsClient;

/// One completion request: the whole session plus sampling parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub params: ModelParams,
}

impl CompletionRequest {
    /// Create new request
    #[inline]
    #[must_use]
    pub fn new(messages: Vec<Message>, params: ModelParams) -> Self {
        Self { messages, params }
    }
}

/// Text-generation service
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Content of the first choice of a non-streaming completion
    ///
    /// # Errors
    /// Returns error on transport failure or a non-success response
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}

