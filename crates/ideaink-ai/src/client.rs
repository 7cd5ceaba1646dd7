//! Generative text endpoint clients.

use crate::parse::MIN_IDEAS;
use crate::prompt::{GenerationKind, GenerationRequest, subject_of};
use ideaink_core::storage::BoxFuture;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_URL: &str = "http://localhost:8080/v1/generate";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Generation errors. None of these reach the user: the service turns them
/// into placeholder results.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Response has no text content")]
    MalformedResponse,
}

/// Endpoint and sampling settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub url: String,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
    pub expand_temperature: f32,
    pub expand_max_tokens: u32,
    pub summarize_temperature: f32,
    pub summarize_max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_key: None,
            model: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            expand_temperature: 0.7,
            expand_max_tokens: 150,
            summarize_temperature: 0.5,
            summarize_max_tokens: 120,
        }
    }
}

impl GeneratorConfig {
    /// Defaults overridden by `IDEAINK_AI_URL`, `IDEAINK_AI_KEY`,
    /// `IDEAINK_AI_MODEL` and `IDEAINK_AI_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(url) = var("IDEAINK_AI_URL") {
            config.url = url;
        }
        config.api_key = var("IDEAINK_AI_KEY");
        config.model = var("IDEAINK_AI_MODEL");
        match var("IDEAINK_AI_TIMEOUT_SECS").map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) => config.timeout = Duration::from_secs(secs),
            Some(Err(e)) => log::warn!("Ignoring IDEAINK_AI_TIMEOUT_SECS: {}", e),
            None => {}
        }
        config
    }
}

/// Something that turns a request into raw model text.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: GenerationRequest) -> BoxFuture<'_, Result<String, GenerateError>>;
}

#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(flatten)]
    request: &'a GenerationRequest,
}

/// Pull the reply text out of a response body.
///
/// Accepts `{"content": ...}` and the OpenAI-style
/// `{"choices": [{"message": {"content": ...}}]}`.
pub fn extract_content(body: &serde_json::Value) -> Option<String> {
    if let Some(text) = body.get("content").and_then(|v| v.as_str()) {
        return Some(text.to_string());
    }
    body.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Posts requests as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl HttpGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl TextGenerator for HttpGenerator {
    fn generate(&self, request: GenerationRequest) -> BoxFuture<'_, Result<String, GenerateError>> {
        Box::pin(async move {
            let body = WireRequest {
                model: self.config.model.as_deref(),
                request: &request,
            };
            let mut builder = self.client.post(&self.config.url).json(&body);
            if let Some(key) = &self.config.api_key {
                builder = builder.bearer_auth(key);
            }

            let response = builder.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerateError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let value: serde_json::Value = response.json().await?;
            extract_content(&value).ok_or(GenerateError::MalformedResponse)
        })
    }
}

/// Answers locally with canned text built from the prompt. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

const OFFLINE_ANGLES: [&str; MIN_IDEAS] = ["basics", "examples", "challenges", "next steps"];

impl OfflineGenerator {
    fn reply(request: &GenerationRequest) -> String {
        let subject = subject_of(&request.user_prompt).unwrap_or("This idea");
        let short: String = subject.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
        match request.kind {
            GenerationKind::Expand => OFFLINE_ANGLES
                .iter()
                .enumerate()
                .map(|(i, angle)| format!("{}. {} {}", i + 1, short, angle))
                .collect::<Vec<_>>()
                .join("\n"),
            GenerationKind::Summarize => format!(
                "{} gathers the ideas of this branch, linking its basics, examples and open \
                 challenges into one view that shows where the map can grow next.",
                subject
            ),
        }
    }
}

impl TextGenerator for OfflineGenerator {
    fn generate(&self, request: GenerationRequest) -> BoxFuture<'_, Result<String, GenerateError>> {
        let reply = Self::reply(&request);
        Box::pin(async move { Ok(reply) })
    }
}
