//! Upstream caller for the generative-language API.
//!
//! One POST per relay request, no retry. The provider is abstracted behind
//! [`GenerativeApi`] so the processor and both HTTP surfaces can be tested
//! against a scripted stand-in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::RelayConfig;

/// Bound on the single upstream attempt; a timeout surfaces as
/// `UpstreamError::Transport` like any other network failure.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub enum UpstreamError {
    /// Network failure or timeout before a status line was read.
    Transport(String),
    /// Non-2xx from the model provider, message taken from its error
    /// envelope when present.
    Status { status: u16, message: String },
}

impl fmt::Display for UpstreamError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            UpstreamError::Transport(msg) => write!(f, "Gemini request failed: {msg}"),
            UpstreamError::Status { status, message } => {
                write!(f, "Gemini API error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for UpstreamError {}

/// A generative-language backend that turns one prompt into one text reply.
///
/// `Ok(None)` means the provider answered successfully but returned no
/// candidate text; callers map that to a degenerate-but-successful reply.
#[async_trait]
pub trait GenerativeApi: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, UpstreamError>;
}

/// Raw-HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    #[must_use]
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.api_key.clone(), config.model.clone(), config.endpoint.clone())
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

// Request envelope: { contents: [{ parts: [{ text }] }], generationConfig: {...} }

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response-format hint asking the model to constrain its own output to JSON.
#[derive(Debug, Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'a str,
}

// Response envelope: { candidates: [{ content: { parts: [{ text }] } }] }

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

// Error envelope: { error: { message } }

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl GenerativeApi for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, UpstreamError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let mut request = self
            .http
            .post(self.url())
            .timeout(UPSTREAM_TIMEOUT)
            .json(&body);

        // The key travels in a header, never in the URL, so it cannot leak
        // into request logs or referrers.
        if let Some(key) = &self.api_key {
            request = request.header("x-goog-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&payload)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("upstream request failed")
                        .to_string()
                });
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&payload)
            .map_err(|e| UpstreamError::Transport(format!("unreadable Gemini response: {e}")))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Ok(None);
        };

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}
