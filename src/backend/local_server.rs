//! Local server backend: an Ollama instance on the loopback interface.
//!
//! No credential is required. This is the only variant that distinguishes
//! "service not started" ([`Error::ServerUnreachable`], from a refused
//! connection) from "service errored" ([`Error::Unknown`]). Requests carry an
//! explicit 30-second ceiling since a local model can take a while to load.

use std::time::Duration;

use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::ResponseBackend;
use crate::error::{Error, Result};

const DEFAULT_API_URL: &str = "http://127.0.0.1:11434";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend for a locally running model server.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: ReqwestClient,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaBackend {
    /// Creates a new backend against the default loopback address.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL.to_string())
    }

    /// Creates a new backend against a custom base URL.
    pub fn with_base_url(base_url: String) -> Result<Self> {
        Url::parse(&base_url)?;
        let client = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;
        Ok(Self { client, base_url })
    }
}

#[async_trait::async_trait]
impl ResponseBackend for OllamaBackend {
    async fn respond(
        &self,
        prompt: &str,
        model: &str,
        _credential: Option<&str>,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::server_unreachable(
                        "the local model server is not running; start it and try again",
                        Some(Box::new(e)),
                    )
                } else if e.is_timeout() {
                    Error::unknown(format!(
                        "request timed out after {} seconds",
                        REQUEST_TIMEOUT.as_secs()
                    ))
                } else {
                    Error::unknown(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::unknown(status.to_string()));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::unknown(format!("failed to parse response: {e}")))?;

        parsed
            .response
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::unknown("no response generated"))
    }
}
