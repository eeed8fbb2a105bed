//! Append-only evaluation transcript shared by every model call in one run.

use crate::llm::{ChatMessage, Role};

/// Ordered, role-tagged message history for one scoring run.
///
/// Appending consumes the transcript and returns the extended one, so every
/// step of the run threads the value explicitly and nothing can rewrite
/// earlier messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Start a transcript with the system primer.
    pub fn new(primer: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(primer)],
        }
    }

    #[must_use]
    pub fn push_user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::user(content));
        self
    }

    #[must_use]
    pub fn push_assistant(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::assistant(content));
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn roles(&self) -> Vec<Role> {
        self.messages.iter().map(|m| m.role).collect()
    }
}
