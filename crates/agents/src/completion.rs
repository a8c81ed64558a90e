use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    /// Deadline for one completion, applied by the agent around the call.
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }
}

impl CompletionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `ESTATE_GEMINI_*`, `ESTATE_COMPLETION_TIMEOUT_SECONDS` and the
    /// API key (`ESTATE_GOOGLE_API_KEY`, then `GOOGLE_API_KEY`). Blank
    /// values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            endpoint: read("ESTATE_GEMINI_ENDPOINT").unwrap_or(defaults.endpoint),
            model: read("ESTATE_GEMINI_MODEL").unwrap_or(defaults.model),
            api_key: read("ESTATE_GOOGLE_API_KEY").or_else(|| read("GOOGLE_API_KEY")),
            timeout: read("ESTATE_COMPLETION_TIMEOUT_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("completion api key is not configured")]
    NotConfigured,
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion body was malformed: {0}")]
    MalformedBody(String),
    #[error("completion returned no candidates")]
    NoCandidates,
}

pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini `generateContent` over HTTPS, authenticated by the `key` query
/// parameter.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: CompletionConfig,
}

impl GeminiClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .build()
            .context("failed to build completion HTTP client")?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    pub fn build_request_body(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }
}

impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CompletionError::NotConfigured)?;

        let response = self
            .http
            .post(self.generate_url())
            .query(&[("key", api_key)])
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| CompletionError::Transport(err.without_url().to_string()))?;

        if status != StatusCode::OK {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        parse_reply(&body)
    }
}

/// Text of the first part of the first candidate.
pub fn parse_reply(body: &str) -> Result<String, CompletionError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| CompletionError::MalformedBody(err.to_string()))?;

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or(CompletionError::NoCandidates)?;

    candidate
        .content
        .parts
        .into_iter()
        .next()
        .and_then(|part| part.text)
        .ok_or_else(|| CompletionError::MalformedBody("first candidate has no text part".to_string()))
}
