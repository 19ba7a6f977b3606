//! Gemini API integration for timekeep.
//!
//! Provides the estimation capability used by the pipeline:
//! - A Gemini `generateContent` client with structured JSON output
//! - Prompt construction and response validation for commit batches
//! - The batch orchestrator that normalizes results and falls back on failure

mod analysis;
mod orchestrator;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tk_core::FailureCategory;

pub use analysis::{build_prompt, parse_analysis, response_schema};
pub use orchestrator::{ESTIMATE_TIMEOUT, Orchestrator};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const ESTIMATE_MAX_TOKENS: u32 = 1000;
const ESTIMATE_TEMPERATURE: f32 = 0.2;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// The response envelope could not be read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The structured output was not valid JSON.
    #[error("malformed structured output: {0}")]
    MalformedOutput(#[source] serde_json::Error),
    /// The structured output did not match the analysis schema.
    #[error("response does not match schema: {0}")]
    InvalidShape(String),
    /// The call exceeded its time bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The service withheld the answer (safety filter, recitation, ...).
    #[error("response withheld: {reason}")]
    Blocked { reason: String },
}

impl LlmError {
    /// Fallback category reported for this error.
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::MalformedOutput(_) => FailureCategory::MalformedOutput,
            Self::InvalidShape(_) => FailureCategory::InvalidShape,
            Self::Timeout(_) => FailureCategory::Timeout,
            Self::Request(err) if err.is_timeout() => FailureCategory::Timeout,
            Self::Request(_) | Self::Api { .. } | Self::InvalidResponse(_) => {
                FailureCategory::Upstream
            }
            Self::InvalidApiKey { .. } | Self::ClientBuild(_) | Self::Blocked { .. } => {
                FailureCategory::Other
            }
        }
    }
}

/// Something that turns an estimation prompt into structured JSON text.
pub trait EstimationBackend {
    /// Returns the raw structured-output text for `prompt`.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>>;
}

impl<T: EstimationBackend> EstimationBackend for &T {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> {
        (**self).generate(prompt)
    }
}

/// Gemini API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given API key and model.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/models/{}:generateContent", self.model)
    }
}

impl EstimationBackend for Client {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: ESTIMATE_TEMPERATURE,
                response_mime_type: "application/json",
                response_schema: response_schema(),
                max_output_tokens: ESTIMATE_MAX_TOKENS,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| LlmError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        let payload: GenerateResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
        extract_text(payload)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    if let Some(reason) = response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
        return Err(LlmError::Blocked { reason });
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(LlmError::InvalidResponse("no candidates".to_string()));
    };
    let pieces: Vec<String> = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();
    if !pieces.is_empty() {
        return Ok(pieces.concat());
    }

    match candidate.finish_reason {
        Some(reason) if reason != "STOP" => Err(LlmError::Blocked { reason }),
        _ => Err(LlmError::InvalidResponse(
            "missing text content".to_string(),
        )),
    }
}

fn parse_api_error(body: &str) -> Option<LlmError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| LlmError::Api {
            message: payload.error.message,
        })
}
