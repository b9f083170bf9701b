//! Google Gemini API client implementation for chat functionality.
//!
//! This module talks to the `generateContent` endpoint of the Gemini API.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::{
    chat::{ChatMessage, ChatProvider, ChatResponse, ChatRole, Usage},
    error::LLMError,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Client for interacting with Google's Gemini API.
pub struct Google {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// Ask the API for an `application/json` reply
    pub json_mode: bool,
    client: Client,
}

#[derive(Serialize, Debug)]
struct GoogleContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GooglePart<'a>>,
}

#[derive(Serialize, Debug)]
struct GooglePart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

/// Request payload for the `generateContent` endpoint.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GoogleChatRequest<'a> {
    contents: Vec<GoogleContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GoogleContent<'a>>,
    generation_config: GoogleGenerationConfig,
}

/// Response from the `generateContent` endpoint.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GoogleChatResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    usage_metadata: Option<GoogleUsageMetadata>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GoogleCandidate {
    content: Option<GoogleResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GoogleResponseContent {
    #[serde(default)]
    parts: Vec<GoogleResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GoogleResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GoogleUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl ChatResponse for GoogleChatResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn usage(&self) -> Option<Usage> {
        self.usage_metadata.as_ref().map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
    }
}

impl fmt::Display for GoogleChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.text(), self.candidates.first()) {
            (Some(text), _) => write!(f, "{text}"),
            (None, Some(GoogleCandidate {
                finish_reason: Some(reason),
                ..
            })) => write!(f, "<no text, finish reason {reason}>"),
            (None, _) => write!(f, ""),
        }
    }
}

impl Google {
    /// Creates a new Gemini client with the specified configuration.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google AI Studio API key
    /// * `proxy_url` - Optional HTTP proxy
    /// * `base_url` - API root, defaults to [`DEFAULT_BASE_URL`]
    /// * `model` - Model to use, defaults to [`DEFAULT_MODEL`]
    /// * `max_tokens` - Maximum tokens to generate
    /// * `temperature` - Sampling temperature
    /// * `timeout_seconds` - Request timeout in seconds
    /// * `system` - System instruction
    /// * `top_p` - Top-p sampling parameter
    /// * `top_k` - Top-k sampling parameter
    /// * `json_mode` - Request a JSON reply
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api_key: impl Into<String>,
        proxy_url: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_seconds: Option<u64>,
        system: Option<String>,
        top_p: Option<f32>,
        top_k: Option<u32>,
        json_mode: bool,
    ) -> Result<Self, LLMError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(sec));
        }
        if let Some(proxy_url) = proxy_url {
            let proxy = reqwest::Proxy::all(&proxy_url)
                .map_err(|e| LLMError::InvalidRequest(format!("Invalid proxy url: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let mut base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| LLMError::InvalidRequest(format!("Invalid base url: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            system,
            timeout_seconds,
            top_p,
            top_k,
            json_mode,
            client: builder
                .build()
                .map_err(|e| LLMError::HttpError(e.to_string()))?,
        })
    }

    fn request_body<'a>(&'a self, messages: &'a [ChatMessage]) -> GoogleChatRequest<'a> {
        let contents = messages
            .iter()
            .map(|m| GoogleContent {
                role: Some(match m.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                }),
                parts: vec![GooglePart { text: &m.content }],
            })
            .collect();

        GoogleChatRequest {
            contents,
            system_instruction: self.system.as_deref().map(|system| GoogleContent {
                role: None,
                parts: vec![GooglePart { text: system }],
            }),
            generation_config: GoogleGenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
                top_k: self.top_k,
                response_mime_type: self.json_mode.then_some("application/json"),
            },
        }
    }

    fn endpoint(&self) -> Result<Url, LLMError> {
        self.base_url
            .join(&format!("models/{}:generateContent", self.model))
            .map_err(|e| LLMError::HttpError(e.to_string()))
    }
}

#[async_trait]
impl ChatProvider for Google {
    /// Sends a chat request to the Gemini API.
    ///
    /// # Arguments
    ///
    /// * `messages` - Slice of chat messages representing the conversation
    ///
    /// # Returns
    ///
    /// The model's response or an error
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        if self.api_key.is_empty() {
            return Err(LLMError::AuthError("Missing Google API key".to_string()));
        }

        let body = self.request_body(messages);

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("Google request payload: {}", json);
            }
        }

        let mut request = self
            .client
            .post(self.endpoint()?)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        if let Some(timeout) = self.timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        let response = request.send().await?;

        log::debug!("Google HTTP status: {}", response.status());

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let raw_response = response.text().await?;
            return Err(LLMError::TooManyRequests(raw_response));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(LLMError::ResponseFormatError {
                message: format!("Google API returned error status: {status}"),
                raw_response: error_text,
            });
        }

        let resp_text = response.text().await?;
        match serde_json::from_str::<GoogleChatResponse>(&resp_text) {
            Ok(response) => Ok(Box::new(response)),
            Err(e) => Err(LLMError::ResponseFormatError {
                message: format!("Failed to decode Google API response: {e}"),
                raw_response: resp_text,
            }),
        }
    }
}
