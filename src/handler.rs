//! Routing of incoming chat messages to the evaluator and back.
//!
//! The chat platform itself is abstracted away: a front end turns whatever
//! its SDK delivers into an [`IncomingMessage`] and supplies a
//! [`ReplySink`] that can post text to a channel.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{error::LLMError, evaluator::Evaluator};

/// A message as seen by the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub author_id: String,
    pub channel_id: String,
    pub content: String,
}

/// Somewhere replies can be posted.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), LLMError>;
}

/// What the handler did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Own message or empty content, nothing was sent
    Ignored,
    /// The evaluation JSON was posted
    Replied,
    /// An error message was posted; holds the error text
    Failed(String),
}

/// Remembers which (author, channel) pairs have talked to the bot.
///
/// Bookkeeping only: nothing about previous messages is kept.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    seen: Mutex<HashSet<String>>,
}

impl SessionRegistry {
    /// Records the session, returning `true` the first time it is seen.
    pub async fn register(&self, author_id: &str, channel_id: &str) -> bool {
        let key = format!("{author_id}::{channel_id}");
        self.seen.lock().await.insert(key)
    }

    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.seen.lock().await.is_empty()
    }
}

pub struct MessageHandler {
    evaluator: Arc<Evaluator>,
    bot_id: String,
    sessions: SessionRegistry,
}

impl MessageHandler {
    /// `bot_id` is the author id the bot posts under; its own messages are
    /// skipped.
    pub fn new(evaluator: Arc<Evaluator>, bot_id: impl Into<String>) -> Self {
        Self {
            evaluator,
            bot_id: bot_id.into(),
            sessions: SessionRegistry::default(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Evaluates `message` and posts the result, or an error description, to
    /// its channel.
    ///
    /// Only a failure to post the reply itself is returned as `Err`.
    pub async fn handle(
        &self,
        message: &IncomingMessage,
        sink: &dyn ReplySink,
    ) -> Result<Outcome, LLMError> {
        if message.author_id == self.bot_id || message.content.trim().is_empty() {
            return Ok(Outcome::Ignored);
        }

        if self
            .sessions
            .register(&message.author_id, &message.channel_id)
            .await
        {
            log::info!(
                "new session for user {} in channel {}",
                message.author_id,
                message.channel_id
            );
        }

        let result = self
            .evaluator
            .evaluate(&message.content)
            .await
            .and_then(|evaluation| evaluation.to_json_pretty().map_err(LLMError::from));

        match result {
            Ok(json) => {
                sink.send(&message.channel_id, &json).await?;
                Ok(Outcome::Replied)
            }
            Err(e) => {
                log::warn!("evaluation failed in channel {}: {e}", message.channel_id);
                let text = e.to_string();
                sink.send(&message.channel_id, &format!("Agent error: {text}"))
                    .await?;
                Ok(Outcome::Failed(text))
            }
        }
    }
}
