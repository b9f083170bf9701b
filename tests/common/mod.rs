#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fact_or_opinion::{
    chat::{ChatMessage, ChatProvider, ChatResponse},
    handler::ReplySink,
    Evaluator, LLMError,
};

#[derive(Debug)]
pub struct CannedResponse(pub Option<String>);

impl fmt::Display for CannedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_deref().unwrap_or_default())
    }
}

impl ChatResponse for CannedResponse {
    fn text(&self) -> Option<String> {
        self.0.clone()
    }
}

/// What the scripted provider does on its next call.
pub enum Reply {
    Text(&'static str),
    Empty,
    Fail(fn() -> LLMError),
}

/// Provider that plays back a script and records every prompt it was sent.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    pub prompts: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            prompts: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(Box::new(self.clone()))
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Reply::Text(text)) => Ok(Box::new(CannedResponse(Some(text.to_string())))),
            Some(Reply::Empty) => Ok(Box::new(CannedResponse(None))),
            Some(Reply::Fail(make)) => Err(make()),
            None => Err(LLMError::Generic("script exhausted".to_string())),
        }
    }
}

/// Sink that keeps every (channel, text) pair it was asked to post.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, String)>>,
    pub broken: bool,
}

impl RecordingSink {
    pub fn broken() -> Self {
        Self {
            sent: Mutex::default(),
            broken: true,
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), LLMError> {
        if self.broken {
            return Err(LLMError::HttpError("channel unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

pub const FENCED_REPLY: &str = "```json\n{\n  \"facts\": [\n    {\"text\": \"The sky is blue.\", \"confidence\": 0.95}\n  ],\n  \"opinions\": [\n    {\"text\": \"I think the sky is beautiful.\", \"confidence\": 0.9}\n  ]\n}\n```";
