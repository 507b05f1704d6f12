//! Hosted keyed backend: Google's Gemini generative-language API.
//!
//! The credential is passed as a request parameter, not a header, matching
//! how the provider's own client library configures itself. Remote failures
//! arrive as error text, not a typed protocol, so classification is a
//! best-effort substring match kept behind [`classify_remote_failure`]; the
//! rest of the system only ever sees the resulting [`Error`] kind.

use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::ResponseBackend;
use crate::error::{Error, Result};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Backend for the hosted keyed text-generation API.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: ReqwestClient,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct RemoteErrorResponse {
    error: Option<RemoteErrorDetail>,
}

#[derive(Deserialize)]
struct RemoteErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

impl GeminiBackend {
    /// Creates a new backend against the production endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL.to_string())
    }

    /// Creates a new backend against a custom base URL.
    pub fn with_base_url(base_url: String) -> Result<Self> {
        Url::parse(&base_url)?;
        let client = ReqwestClient::builder().build().map_err(|e| {
            Error::http_client(format!("Failed to build HTTP client: {e}"), Some(Box::new(e)))
        })?;
        Ok(Self { client, base_url })
    }
}

#[async_trait::async_trait]
impl ResponseBackend for GeminiBackend {
    async fn respond(
        &self,
        prompt: &str,
        model: &str,
        credential: Option<&str>,
    ) -> Result<String> {
        let credential = match credential {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(Error::invalid_credential(
                    "this backend requires an access key",
                ));
            }
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", credential)])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::unknown(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = extract_remote_message(&body).unwrap_or(body);
            return Err(classify_remote_failure(status, &message, model));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::unknown(format!("failed to parse response: {e}")))?;

        first_candidate_text(parsed)
            .ok_or_else(|| Error::unknown("no response generated"))
    }
}

fn first_candidate_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts?
        .into_iter()
        .find_map(|part| part.text)
        .filter(|text| !text.is_empty())
}

/// Pulls the message (and status, when present) out of a remote error body.
fn extract_remote_message(body: &str) -> Option<String> {
    let parsed: RemoteErrorResponse = serde_json::from_str(body).ok()?;
    let detail = parsed.error?;
    match (detail.status, detail.message) {
        (Some(status), Some(message)) => Some(format!("{status}: {message}")),
        (None, Some(message)) => Some(message),
        (Some(status), None) => Some(status),
        (None, None) => None,
    }
}

/// Classifies a remote failure message into a typed error.
///
/// The mapping is substring matching against the remote error text, so it is
/// best effort. Anything unrecognized comes back as [`Error::Unknown`] with
/// the original message preserved.
fn classify_remote_failure(status: u16, message: &str, model: &str) -> Error {
    let haystack = message.to_lowercase();

    if haystack.contains("api_key_invalid") || haystack.contains("api key not valid") {
        return Error::invalid_credential(message.to_string());
    }
    if status == 403 || haystack.contains("permission_denied") || haystack.contains("permission denied") {
        return Error::permission_denied(message.to_string());
    }
    if status == 429 || haystack.contains("resource_exhausted") || haystack.contains("quota") {
        return Error::quota_exceeded(message.to_string());
    }
    if status == 404 || haystack.contains("not_found") || haystack.contains("not found") {
        return Error::model_not_found(message.to_string(), Some(model.to_string()));
    }
    if status == 401 || haystack.contains("unauthenticated") || haystack.contains("unauthorized") {
        return Error::authentication_failed(message.to_string());
    }

    Error::unknown(message.to_string())
}
