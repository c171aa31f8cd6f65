//! Text-generation client boundary.
//!
//! # Responsibility
//! - Define the single "prompt in, text out" contract the fill logic needs.
//! - Provide blocking HTTP implementations for the site proxy and for the
//!   Gemini REST API.
//!
//! # Invariants
//! - No retries: one failure is reported once and the caller gives up.
//! - Non-2xx responses become `AiError::Api` with the best message found in
//!   the body.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Model used by the direct Gemini client.
pub const GEMINI_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub type AiResult<T> = Result<T, AiError>;

/// Error for generation calls and for decoding their output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// No endpoint or key configured.
    NotConfigured(String),
    /// Transport failure (connect, timeout, TLS).
    Network(String),
    /// Non-success HTTP status.
    Api { status: u16, message: String },
    /// Response body or embedded JSON could not be decoded.
    Parse(String),
    /// Response decoded but carries no usable content.
    EmptyResponse,
}

impl Display for AiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured(message) => write!(f, "AI not configured: {message}"),
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Api { status, message } => write!(f, "API error ({status}): {message}"),
            Self::Parse(message) => write!(f, "failed to parse AI response: {message}"),
            Self::EmptyResponse => write!(f, "AI response was empty"),
        }
    }
}

impl Error for AiError {}

/// One generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
        }
    }
}

/// Anything that turns a prompt into text.
pub trait GenerationClient {
    fn generate(&self, request: &GenerationRequest) -> AiResult<String>;
}

impl<T: GenerationClient + ?Sized> GenerationClient for &T {
    fn generate(&self, request: &GenerationRequest) -> AiResult<String> {
        (**self).generate(request)
    }
}

impl<T: GenerationClient + ?Sized> GenerationClient for Box<T> {
    fn generate(&self, request: &GenerationRequest) -> AiResult<String> {
        (**self).generate(request)
    }
}

#[derive(Deserialize)]
struct ProxyResponse {
    text: Option<String>,
    error: Option<String>,
}

/// Client for the site proxy: `POST {prompt, systemInstruction}` returning
/// `{text}` or `{error}`.
pub struct ProxyClient {
    endpoint: String,
    http: reqwest::blocking::Client,
}

impl ProxyClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AiResult<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            http: build_http(timeout)?,
        })
    }
}

impl GenerationClient for ProxyClient {
    fn generate(&self, request: &GenerationRequest) -> AiResult<String> {
        let started_at = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|err| log_failure("proxy", started_at, AiError::Network(err.to_string())))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        let decoded = serde_json::from_str::<ProxyResponse>(&body).ok();

        if !status.is_success() {
            let message = decoded
                .and_then(|payload| payload.error)
                .unwrap_or_else(|| format!("API Error: {}", status.as_u16()));
            return Err(log_failure(
                "proxy",
                started_at,
                AiError::Api {
                    status: status.as_u16(),
                    message,
                },
            ));
        }

        let text = decoded
            .ok_or_else(|| AiError::Parse("proxy body is not JSON".to_string()))
            .and_then(|payload| payload.text.ok_or(AiError::EmptyResponse))
            .map_err(|err| log_failure("proxy", started_at, err))?;

        info!(
            "event=ai_generate module=ai status=ok backend=proxy duration_ms={} response_chars={}",
            started_at.elapsed().as_millis(),
            text.chars().count()
        );
        Ok(text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Direct client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> AiResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AiError::NotConfigured("Gemini API key is empty".to_string()));
        }
        Ok(Self {
            api_key,
            model: GEMINI_MODEL.to_string(),
            http: build_http(timeout)?,
        })
    }

    /// Overrides the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl GenerationClient for GeminiClient {
    fn generate(&self, request: &GenerationRequest) -> AiResult<String> {
        let started_at = Instant::now();
        let url = format!("{GEMINI_ENDPOINT}/{}:generateContent", self.model);
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: &request.prompt,
                }],
            }],
            system_instruction: request
                .system_instruction
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(|text| GeminiContent {
                    parts: vec![GeminiPart { text }],
                }),
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|err| log_failure("gemini", started_at, AiError::Network(err.to_string())))?;

        let status = response.status();
        let raw = response.text().unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorBody>(&raw)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(log_failure(
                "gemini",
                started_at,
                AiError::Api {
                    status: status.as_u16(),
                    message,
                },
            ));
        }

        let text = serde_json::from_str::<GeminiResponse>(&raw)
            .map_err(|err| AiError::Parse(err.to_string()))
            .and_then(|payload| {
                payload
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|candidate| candidate.content)
                    .and_then(|content| content.parts.into_iter().next())
                    .and_then(|part| part.text)
                    .ok_or(AiError::EmptyResponse)
            })
            .map_err(|err| log_failure("gemini", started_at, err))?;

        info!(
            "event=ai_generate module=ai status=ok backend=gemini duration_ms={} response_chars={}",
            started_at.elapsed().as_millis(),
            text.chars().count()
        );
        Ok(text)
    }
}

fn build_http(timeout: Duration) -> AiResult<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| AiError::Network(err.to_string()))
}

fn log_failure(backend: &str, started_at: Instant, err: AiError) -> AiError {
    warn!(
        "event=ai_generate module=ai status=error backend={backend} duration_ms={} error={err}",
        started_at.elapsed().as_millis()
    );
    err
}

#[cfg(test)]
mod tests {
    use super::{GeminiClient, GenerationRequest};
    use std::time::Duration;

    #[test]
    fn request_uses_camel_case_and_omits_missing_instruction() {
        let json = serde_json::to_value(GenerationRequest::new("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "prompt": "hi" }));

        let mut request = GenerationRequest::new("hi");
        request.system_instruction = Some("be brief".to_string());
        let json = serde_json::to_value(request).unwrap();
        assert_eq!(json["systemInstruction"], "be brief");
    }

    #[test]
    fn gemini_client_requires_key() {
        assert!(GeminiClient::new("  ", Duration::from_secs(1)).is_err());
    }
}
