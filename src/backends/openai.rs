//! Client for any OpenAI-compatible `chat/completions` endpoint.
//!
//! Covers OpenAI itself as well as hosts that mirror its API (Together,
//! Groq, DeepSeek, llama.cpp and other local servers).

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::{
    chat::{ChatMessage, ChatProvider, ChatResponse, ChatRole, Usage},
    error::LLMError,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Client for an OpenAI-compatible API.
pub struct OpenAICompatible {
    /// Optional, local servers usually run without one
    pub api_key: Option<String>,
    pub base_url: Url,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub top_p: Option<f32>,
    /// Send `response_format: {"type": "json_object"}`
    pub json_mode: bool,
    client: Client,
}

#[derive(Serialize, Debug)]
struct OpenAIChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    response_type: &'static str,
}

/// Request payload for the chat completions endpoint.
#[derive(Serialize, Debug)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

/// Response from the chat completions endpoint.
#[derive(Deserialize, Debug)]
pub struct OpenAIChatResponse {
    choices: Vec<OpenAIChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct OpenAIChatChoice {
    message: OpenAIChatMsg,
}

#[derive(Deserialize, Debug)]
struct OpenAIChatMsg {
    content: Option<String>,
}

impl ChatResponse for OpenAIChatResponse {
    fn text(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.is_empty())
    }

    fn usage(&self) -> Option<Usage> {
        self.usage.clone()
    }
}

impl std::fmt::Display for OpenAIChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text().unwrap_or_default())
    }
}

impl OpenAICompatible {
    /// Creates a new client with the specified configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api_key: Option<String>,
        proxy_url: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_seconds: Option<u64>,
        system: Option<String>,
        top_p: Option<f32>,
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

        // Url::join drops the last path segment unless it ends with '/'.
        let mut base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| LLMError::InvalidRequest(format!("Invalid base url: {e}")))?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            system,
            timeout_seconds,
            top_p,
            json_mode,
            client: builder
                .build()
                .map_err(|e| LLMError::HttpError(e.to_string()))?,
        })
    }

    fn request_body<'a>(&'a self, messages: &'a [ChatMessage]) -> OpenAIChatRequest<'a> {
        let mut openai_msgs: Vec<OpenAIChatMessage> = messages
            .iter()
            .map(|m| OpenAIChatMessage {
                role: match m.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                },
                content: &m.content,
            })
            .collect();

        if let Some(system) = &self.system {
            openai_msgs.insert(
                0,
                OpenAIChatMessage {
                    role: "system",
                    content: system,
                },
            );
        }

        OpenAIChatRequest {
            model: &self.model,
            messages: openai_msgs,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
            top_p: self.top_p,
            response_format: self.json_mode.then_some(OpenAIResponseFormat {
                response_type: "json_object",
            }),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAICompatible {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        let body = self.request_body(messages);

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("OpenAI-compatible request payload: {}", json);
            }
        }

        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|e| LLMError::HttpError(e.to_string()))?;

        let mut request = self.client.post(url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        if let Some(timeout) = self.timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        let response = request.send().await?;

        log::debug!("OpenAI-compatible HTTP status: {}", response.status());

        match response.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                return Err(LLMError::TooManyRequests(response.text().await?));
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                let status = response.status();
                let error_text = response.text().await?;
                return Err(LLMError::AuthError(format!("{status}: {error_text}")));
            }
            status if !status.is_success() => {
                let error_text = response.text().await?;
                return Err(LLMError::ResponseFormatError {
                    message: format!("API returned error status: {status}"),
                    raw_response: error_text,
                });
            }
            _ => {}
        }

        let resp_text = response.text().await?;
        match serde_json::from_str::<OpenAIChatResponse>(&resp_text) {
            Ok(response) => Ok(Box::new(response)),
            Err(e) => Err(LLMError::ResponseFormatError {
                message: format!("Failed to decode API response: {e}"),
                raw_response: resp_text,
            }),
        }
    }
}
