//! Builder for configuring and instantiating a [`ChatProvider`].

use std::str::FromStr;

use crate::{
    backends::{google::Google, openai::OpenAICompatible},
    chat::ChatProvider,
    error::LLMError,
    secret_store::SecretStore,
};

/// Supported LLM backend providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LLMBackend {
    /// Google Gemini
    #[default]
    Google,
    /// OpenAI or any server exposing the same chat completions API
    OpenAICompatible,
}

impl LLMBackend {
    /// Prefix of the secret/environment keys read by [`LLMBuilder::from_secrets`].
    pub fn key_prefix(&self) -> &'static str {
        match self {
            LLMBackend::Google => "GOOGLE",
            LLMBackend::OpenAICompatible => "OPENAI",
        }
    }
}

impl FromStr for LLMBackend {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gemini" => Ok(LLMBackend::Google),
            "openai" | "openai-compatible" | "openai_compatible" => {
                Ok(LLMBackend::OpenAICompatible)
            }
            _ => Err(LLMError::InvalidRequest(format!("Unknown LLM backend: {s}"))),
        }
    }
}

impl std::fmt::Display for LLMBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMBackend::Google => write!(f, "google"),
            LLMBackend::OpenAICompatible => write!(f, "openai"),
        }
    }
}

/// Builder for configuring a provider.
///
/// ```
/// use fact_or_opinion::builder::{LLMBackend, LLMBuilder};
///
/// let llm = LLMBuilder::new()
///     .backend(LLMBackend::Google)
///     .api_key("test-key")
///     .model("gemini-2.0-flash")
///     .temperature(0.0)
///     .build();
/// assert!(llm.is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LLMBuilder {
    backend: Option<LLMBackend>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    timeout_seconds: Option<u64>,
    system: Option<String>,
    proxy_url: Option<String>,
    json_mode: bool,
}

impl LLMBuilder {
    /// Creates a new empty builder instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from `<PREFIX>_API_KEY`, `<PREFIX>_MODEL`,
    /// `<PREFIX>_BASE_URL`, `<PREFIX>_MAX_TOKENS`, `<PREFIX>_TEMPERATURE`,
    /// `<PREFIX>_TOP_P`, `<PREFIX>_TOP_K`, `<PREFIX>_TIMEOUT_SECONDS` and
    /// `<PREFIX>_PROXY_URL`, where the prefix is
    /// `GOOGLE` or `OPENAI`. Unparseable numbers are ignored.
    pub fn from_secrets(backend: LLMBackend, secrets: &SecretStore) -> Self {
        let prefix = backend.key_prefix();
        let get = |name: &str| secrets.get(&format!("{prefix}_{name}"));

        Self {
            backend: Some(backend),
            api_key: get("API_KEY"),
            base_url: get("BASE_URL"),
            model: get("MODEL"),
            max_tokens: get("MAX_TOKENS").and_then(|s| s.parse().ok()),
            temperature: get("TEMPERATURE").and_then(|s| s.parse().ok()),
            top_p: get("TOP_P").and_then(|s| s.parse().ok()),
            top_k: get("TOP_K").and_then(|s| s.parse().ok()),
            timeout_seconds: get("TIMEOUT_SECONDS").and_then(|s| s.parse().ok()),
            system: None,
            proxy_url: get("PROXY_URL"),
            json_mode: false,
        }
    }

    /// Sets the backend provider to use.
    pub fn backend(mut self, backend: LLMBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for API requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the temperature for controlling response randomness (0.0-1.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Sets the system prompt/context.
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Asks the provider for a JSON-only reply where the API supports it.
    pub fn json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Builds and returns a configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend was selected, if the Google backend
    /// has no API key, or if a URL is invalid.
    pub fn build(self) -> Result<Box<dyn ChatProvider>, LLMError> {
        let backend = self
            .backend
            .ok_or_else(|| LLMError::InvalidRequest("No backend specified".to_string()))?;

        log::debug!(
            "building {backend} provider (model: {})",
            self.model.as_deref().unwrap_or("default")
        );

        let provider: Box<dyn ChatProvider> = match backend {
            LLMBackend::Google => {
                let api_key = self.api_key.ok_or_else(|| {
                    LLMError::AuthError("No API key provided for Google".to_string())
                })?;
                Box::new(Google::new(
                    api_key,
                    self.proxy_url,
                    self.base_url,
                    self.model,
                    self.max_tokens,
                    self.temperature,
                    self.timeout_seconds,
                    self.system,
                    self.top_p,
                    self.top_k,
                    self.json_mode,
                )?)
            }
            LLMBackend::OpenAICompatible => Box::new(OpenAICompatible::new(
                self.api_key,
                self.proxy_url,
                self.base_url,
                self.model,
                self.max_tokens,
                self.temperature,
                self.timeout_seconds,
                self.system,
                self.top_p,
                self.json_mode,
            )?),
        };

        Ok(provider)
    }
}
