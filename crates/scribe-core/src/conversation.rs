//! Conversation sessions
//!
//! One [`ConversationSession`] per generation thread. The system prompt is
//! pinned at index 0; [`ConversationSession::trim_window`] bounds everything
//! after it.

use serde::{Deserialize, Serialize};

/// Messages kept after the system prompt when trimming
pub const WINDOW_TAIL: usize = 4;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// System message
    #[inline]
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message
    #[inline]
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Assistant message
    #[inline]
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered message history with a pinned system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSession {
    messages: Vec<Message>,
}

impl ConversationSession {
    /// Start a session with its system prompt
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Collapse to `[system] + last WINDOW_TAIL` once longer than that
    ///
    /// Returns the number of evicted messages.
    pub fn trim_window(&mut self) -> usize {
        let cap = 1 + WINDOW_TAIL;
        if self.messages.len() <= cap {
            return 0;
        }
        let evicted = self.messages.len() - cap;
        self.messages.drain(1..=evicted);
        tracing::debug!(evicted, "conversation window trimmed");
        evicted
    }

    /// All messages, system prompt first
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The pinned system message
    #[inline]
    #[must_use]
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    /// Most recent message
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages including the system prompt
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; the system prompt is never evicted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
