//! Hosted keyless backend: the Hugging Face Inference API free tier.
//!
//! No credential is required. Generation parameters are fixed: bounded
//! output length, fixed sampling temperature, sampling enabled. The service
//! reports failures as bare HTTP statuses rather than structured errors, so
//! every non-2xx response maps to [`Error::Unknown`] carrying the status code
//! and body text.

use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::ResponseBackend;
use crate::error::{Error, Result};

const DEFAULT_API_URL: &str = "https://api-inference.huggingface.co";

/// Bounded output length for free-tier generation.
const MAX_LENGTH: u32 = 100;

/// Fixed sampling temperature for free-tier generation.
const TEMPERATURE: f32 = 0.7;

/// Backend for the hosted keyless inference endpoint.
#[derive(Debug, Clone)]
pub struct HuggingFaceBackend {
    client: ReqwestClient,
    base_url: String,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_length: u32,
    temperature: f32,
    do_sample: bool,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: Option<String>,
}

impl HuggingFaceBackend {
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
impl ResponseBackend for HuggingFaceBackend {
    async fn respond(
        &self,
        prompt: &str,
        model: &str,
        _credential: Option<&str>,
    ) -> Result<String> {
        let url = format!("{}/models/{}", self.base_url, model);
        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_length: MAX_LENGTH,
                temperature: TEMPERATURE,
                do_sample: true,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::unknown(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::unknown(format!("{} - {}", status.as_u16(), body)));
        }

        let parsed: Vec<GeneratedText> = match response.json().await {
            Ok(parsed) => parsed,
            Err(_) => return Err(Error::unknown("no response generated")),
        };

        parsed
            .into_iter()
            .next()
            .and_then(|entry| entry.generated_text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::unknown("no response generated"))
    }
}
