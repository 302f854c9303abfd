//! Core `LlmClient` trait and `ApiClient` implementation.
//!
//! `ApiClient` talks to either the Ollama native `/api/generate` endpoint or
//! any OpenAI-compatible `/v1/chat/completions` endpoint.  All connection
//! details come from [`LlmConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{LlmConfig, LlmProvider};

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while calling the language model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("language model request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse language model response: {0}")]
    Parse(String),

    /// The response carried no text field at all.
    #[error("language model returned an empty response")]
    EmptyResponse,

    /// The provider is set to `Disabled` in the settings.
    #[error("the language model is disabled in the settings")]
    Disabled,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// LlmClient trait
// ---------------------------------------------------------------------------

/// A single non-streaming completion call.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn LlmClient>`.
///
/// # Arguments
/// * `system` – Optional system / persona instruction.
/// * `prompt` – The user prompt.
///
/// The returned text is exactly what the model produced, whitespace included.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// HTTP client for Ollama or an OpenAI-compatible server.
pub struct ApiClient {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl ApiClient {
    /// Build an `ApiClient` from application config.
    ///
    /// The API key, if any, is read once from the environment variable named
    /// by `config.api_key_env`.  No timeout is applied unless
    /// `config.timeout_secs` is set.
    pub fn from_config(config: &LlmConfig) -> Self {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());

        if config.api_key_env.is_some() && api_key.is_none() {
            log::warn!(
                "LLM API key variable {:?} is not set; requests will be unauthenticated",
                config.api_key_env
            );
        }

        Self::with_api_key(config, api_key)
    }

    /// Build with an explicit API key (tests / callers that resolved it
    /// themselves).
    pub fn with_api_key(config: &LlmConfig, api_key: Option<String>) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            api_key,
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError> {
        let mut req = self.client.post(url).json(body);

        // Attach Authorization header only when an api key was resolved.
        if let Some(key) = self.api_key.as_deref() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }

    async fn ollama_generate(
        &self,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url());

        let mut body = serde_json::json!({
            "model":   self.config.model,
            "prompt":  prompt,
            "stream":  false,
            "options": { "temperature": self.config.temperature }
        });
        if let Some(system) = system {
            body["system"] = serde_json::Value::from(system);
        }

        let json = self.post_json(&url, &body).await?;
        json["response"]
            .as_str()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }

    async fn chat_completion(
        &self,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url());

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": prompt }));

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages":    messages,
            "stream":      false,
            "temperature": self.config.temperature
        });

        let json = self.post_json(&url, &body).await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LlmClient for ApiClient {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        let text = match self.config.provider {
            LlmProvider::Ollama => self.ollama_generate(system, prompt).await?,
            LlmProvider::OpenAiCompatible => self.chat_completion(system, prompt).await?,
            LlmProvider::Disabled => return Err(LlmError::Disabled),
        };

        log::debug!("LLM completion received (len={})", text.len());
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
