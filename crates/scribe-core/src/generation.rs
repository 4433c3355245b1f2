//! Validated generation loop
//!
//! One call to [`generate_validated`] asks the model for code, extracts the
//! fenced block and checks it parses. Failed attempts stay in the session,
//! followed by a corrective user message, and the whole call is retried while
//! the [`RetryBudget`] lasts.

use crate::config::ModelParams;
use crate::conversation::{ConversationSession, Message};
use crate::error::ModelError;
use crate::extract::extract_code;
use crate::model::{CompletionRequest, ModelService};
use crate::prompts::{missing_code_feedback, syntax_feedback};
use scribe_artifact::{check_python, SyntaxError};

/// Number of retries left for one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetryBudget(u32);

impl RetryBudget {
    /// Create budget of `retries` retries (total attempts = `retries + 1`)
    #[inline]
    #[must_use]
    pub fn new(retries: u32) -> Self {
        Self(retries)
    }

    /// Retries left
    #[inline]
    #[must_use]
    pub fn remaining(self) -> u32 {
        self.0
    }

    /// Spend one retry; `None` once exhausted
    #[inline]
    #[must_use]
    pub fn consume(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

/// Final result of a generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Extracted code parses
    Valid(String),
    /// Last extraction still does not parse
    Invalid { code: String, error: SyntaxError },
    /// Last reply had no fenced block
    Missing,
}

impl Generation {
    /// Extracted code, valid or not
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Valid(code) | Self::Invalid { code, .. } => Some(code),
            Self::Missing => None,
        }
    }

    /// Check if the code parses
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Generation plus the number of model calls it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub generation: Generation,
    pub attempts: u32,
}

/// Ask the model for code until it parses or the budget runs out
///
/// The session must already end with the request message. Each reply is
/// appended as an assistant message; each retry appends a corrective user
/// message first. Window trimming is left to the caller.
///
/// # Errors
/// Returns error if a model call fails; no further attempts are made
pub async fn generate_validated<M>(
    model: &M,
    session: &mut ConversationSession,
    params: ModelParams,
    mut budget: RetryBudget,
) -> Result<GenerationOutcome, ModelError>
where
    M: ModelService + ?Sized,
{
    let mut attempts = 0;

    loop {
        attempts += 1;
        let request = CompletionRequest::new(session.messages().to_vec(), params);
        let reply = model.complete(&request).await?;
        session.push(Message::assistant(reply.as_str()));

        let (generation, feedback) = match extract_code(&reply) {
            None => (Generation::Missing, missing_code_feedback()),
            Some(code) => match check_python(&code) {
                Ok(_) => {
                    tracing::debug!(attempts, "generation valid");
                    return Ok(GenerationOutcome {
                        generation: Generation::Valid(code),
                        attempts,
                    });
                }
                Err(error) => {
                    let feedback = syntax_feedback(&error);
                    (Generation::Invalid { code, error }, feedback)
                }
            },
        };

        match budget.consume() {
            Some(next) => {
                tracing::debug!(attempts, remaining = next.remaining(), "retrying generation");
                budget = next;
                session.push(Message::user(feedback));
            }
            None => {
                tracing::debug!(attempts, "retry budget exhausted");
                return Ok(GenerationOutcome {
                    generation,
                    attempts,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays canned replies and records the length of each request
    struct Replay {
        replies: Mutex<VecDeque<String>>,
        request_lens: Mutex<Vec<usize>>,
    }

    impl Replay {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
                request_lens: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.request_lens.lock().len()
        }
    }

    #[async_trait]
    impl ModelService for Replay {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
            self.request_lens.lock().push(request.messages.len());
            self.replies
                .lock()
                .pop_front()
                .ok_or(ModelError::EmptyResponse)
        }
    }

    const PARAMS: ModelParams = ModelParams {
        max_tokens: 100,
        temperature: 0.0,
    };

    fn session() -> ConversationSession {
        let mut session = ConversationSession::new("system");
        session.push(Message::user("write it"));
        session
    }

    #[tokio::test]
    async fn valid_first_reply_needs_one_call() {
        let model = Replay::new(&["```python\nx = 1\n```"]);
        let mut session = session();

        let outcome = generate_validated(&model, &mut session, PARAMS, RetryBudget::new(2))
            .await
            .unwrap();

        assert_eq!(outcome.generation, Generation::Valid("x = 1".into()));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(session.len(), 3);
        assert_eq!(session.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn always_invalid_uses_budget_plus_one_calls() {
        let bad = ["```python\ndef (\n```", "```python\nclass :\n```", "```python\nreturn )\n```"];
        let model = Replay::new(&bad);
        let mut session = session();

        let outcome = generate_validated(&model, &mut session, PARAMS, RetryBudget::new(2))
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(model.calls(), 3);
        assert_eq!(outcome.generation.code(), Some("return )"));
        assert!(!outcome.generation.is_valid());
        // request, then (reply + feedback) twice, then final reply
        assert_eq!(session.len(), 2 + 3 + 2);
    }

    #[tokio::test]
    async fn retry_carries_feedback_and_history() {
        let model = Replay::new(&["no code here", "```python\nok = True\n```"]);
        let mut session = session();

        let outcome = generate_validated(&model, &mut session, PARAMS, RetryBudget::new(1))
            .await
            .unwrap();

        assert_eq!(outcome.generation, Generation::Valid("ok = True".into()));
        assert_eq!(outcome.attempts, 2);
        assert_eq!(*model.request_lens.lock(), vec![2, 4]);

        let messages = session.messages();
        assert_eq!(messages[2].content, "no code here");
        assert_eq!(messages[3].role, Role::User);
        assert!(messages[3].content.contains("did not contain"));
    }

    #[tokio::test]
    async fn misindented_reply_is_retried() {
        let model = Replay::new(&[
            "```python\ndef test_total():\nassert total([]) == 0\n```",
            "```python\ndef test_total():\n    assert total([]) == 0\n```",
        ]);
        let mut session = session();

        let outcome = generate_validated(&model, &mut session, PARAMS, RetryBudget::new(1))
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 2);
        assert!(outcome.generation.is_valid());
        assert!(session.messages()[3].content.contains("not valid Python"));
    }

    #[tokio::test]
    async fn zero_budget_returns_missing() {
        let model = Replay::new(&["sorry"]);
        let mut session = session();

        let outcome = generate_validated(&model, &mut session, PARAMS, RetryBudget::new(0))
            .await
            .unwrap();

        assert_eq!(outcome.generation, Generation::Missing);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn model_error_propagates() {
        let model = Replay::new(&[]);
        let mut session = session();

        let result = generate_validated(&model, &mut session, PARAMS, RetryBudget::new(3)).await;
        assert!(matches!(result, Err(ModelError::EmptyResponse)));
    }

    #[test]
    fn budget_consumption() {
        let budget = RetryBudget::new(1);
        let next = budget.consume().unwrap();
        assert_eq!(next.remaining(), 0);
        assert_eq!(next.consume(), None);
    }
}
