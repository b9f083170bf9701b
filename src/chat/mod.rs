use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LLMError;

/// Role of a participant in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    /// The user/human participant in the conversation
    User,
    /// The AI assistant participant in the conversation
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of who sent this message (user or assistant)
    pub role: ChatRole,
    /// The text content of the message
    pub content: String,
}

/// Token accounting reported by a provider, when it reports any.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

pub trait ChatResponse: std::fmt::Debug + std::fmt::Display + Send {
    fn text(&self) -> Option<String>;
    fn usage(&self) -> Option<Usage> {
        None
    }
}

/// Trait for providers that support chat-style interactions.
#[async_trait]
pub trait ChatProvider: Sync + Send {
    /// Sends a chat request to the provider with a sequence of messages.
    ///
    /// # Arguments
    ///
    /// * `messages` - The conversation history as a slice of chat messages
    ///
    /// # Returns
    ///
    /// The provider's response or an error
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError>;

    /// Sends `prompt` as a single user message and returns the reply text.
    ///
    /// A reply that carries no text (for instance one the provider blocked)
    /// is an error.
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        let req = [ChatMessage::user().content(prompt).build()];
        let response = self.chat(&req).await?;
        if let Some(usage) = response.usage() {
            log::debug!("completion used {} tokens", usage.total_tokens);
        }
        response
            .text()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LLMError::ResponseFormatError {
                message: "No response text from model".to_string(),
                raw_response: response.to_string(),
            })
    }
}

impl ChatMessage {
    /// Create a new builder for a user message
    pub fn user() -> ChatMessageBuilder {
        ChatMessageBuilder::new(ChatRole::User)
    }

    /// Create a new builder for an assistant message
    pub fn assistant() -> ChatMessageBuilder {
        ChatMessageBuilder::new(ChatRole::Assistant)
    }
}

/// Builder for ChatMessage
#[derive(Debug)]
pub struct ChatMessageBuilder {
    role: ChatRole,
    content: String,
}

impl ChatMessageBuilder {
    /// Create a new ChatMessageBuilder with specified role
    pub fn new(role: ChatRole) -> Self {
        Self {
            role,
            content: String::new(),
        }
    }

    /// Set the message content
    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    /// Build the ChatMessage
    pub fn build(self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Canned(Option<String>);

    impl fmt::Display for Canned {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0.clone().unwrap_or_default())
        }
    }

    impl ChatResponse for Canned {
        fn text(&self) -> Option<String> {
            self.0.clone()
        }
    }

    struct Echo;

    #[async_trait]
    impl ChatProvider for Echo {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
            let last = messages.last().map(|m| m.content.clone());
            Ok(Box::new(Canned(last.filter(|c| c != "silence"))))
        }
    }

    #[test]
    fn builder_sets_role_and_content() {
        let msg = ChatMessage::assistant().content("hi").build();
        assert_eq!(msg.role, ChatRole::Assistant);
        assert_eq!(msg.content, "hi");
        assert_eq!(ChatMessage::user().build().content, "");
    }

    #[tokio::test]
    async fn complete_returns_reply_text() {
        assert_eq!(Echo.complete("hello").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn complete_rejects_missing_text() {
        let err = Echo.complete("silence").await.unwrap_err();
        assert!(matches!(err, LLMError::ResponseFormatError { .. }));
    }
}
