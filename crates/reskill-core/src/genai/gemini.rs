//! Gemini `generateContent` client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::GenerationError;
use super::trait_def::Generator;

/// Returned when the response carries no candidate text.
pub const FALLBACK_REPLY: &str = "A IA não conseguiu gerar uma resposta agora.";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where and how to reach the generation service.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    /// Per-request timeout. `None` waits as long as the transport allows.
    pub timeout_secs: Option<u64>,
}

impl GenerationConfig {
    pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            timeout_secs: None,
        }
    }

    /// `{endpoint}/models/{model}:generateContent` (no key).
    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<OutputConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct OutputConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str, json_output: bool) -> Self {
        Self {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: json_output.then_some(OutputConfig {
                response_mime_type: "application/json",
            }),
        }
    }
}

/// `candidates[0].content.parts[0].text`, if present.
fn first_candidate_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`Generator`] backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(GenerationError::Transport)?;
        Self::with_client(http, config)
    }

    pub fn with_client(http: Client, config: GenerationConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::NotConfigured(
                "missing generation API key".to_string(),
            ));
        }
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    async fn call(&self, prompt: &str, json_output: bool) -> Result<String, GenerationError> {
        let url = self.config.url();
        debug!(%url, json_output, prompt_chars = prompt.len(), "generation request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&GenerateRequest::new(prompt, json_output))
            .send()
            .await
            .map_err(GenerationError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "generation request rejected");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(GenerationError::InvalidBody)?;
        match first_candidate_text(&body) {
            Some(text) => Ok(text.to_string()),
            None => {
                warn!(model = %self.config.model, "response has no candidate text, using fallback reply");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }
}

#[async_trait]
impl Generator for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.call(prompt, false).await
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, GenerationError> {
        self.call(prompt, true).await
    }
}
