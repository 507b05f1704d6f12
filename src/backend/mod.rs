//! Response backends.
//!
//! A backend sends one prompt to an external text-generation service and
//! returns one completion or a typed failure. Backends are stateless with
//! respect to the conversation: every call is parameterized purely by the
//! prompt, the model identifier, and an optional credential.
//!
//! The set of backends is closed. Selection happens through [`BackendKind`],
//! an explicit enum, so an invalid variant is a compile-time impossibility
//! rather than a failed string lookup.

mod hosted_keyed;
mod hosted_keyless;
mod local_server;

use std::fmt;
use std::str::FromStr;

pub use hosted_keyed::GeminiBackend;
pub use hosted_keyless::HuggingFaceBackend;
pub use local_server::OllamaBackend;

use crate::error::{Error, Result};

/// The closed set of backend variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// A hosted cloud model that requires an access key.
    HostedKeyed,

    /// A free hosted inference endpoint; no credential.
    HostedKeyless,

    /// A model server running on the local machine; no credential.
    LocalServer,
}

impl BackendKind {
    /// Returns true if this backend requires a credential before a prompt
    /// can be submitted.
    pub fn requires_credential(&self) -> bool {
        matches!(self, BackendKind::HostedKeyed)
    }

    /// The default model identifier for this backend.
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::HostedKeyed => "gemini-2.5-flash",
            BackendKind::HostedKeyless => "microsoft/DialoGPT-medium",
            BackendKind::LocalServer => "llama2",
        }
    }

    /// Suggested model identifiers for this backend.
    ///
    /// These are starting points, not an exhaustive catalog; any identifier
    /// the remote service recognizes works.
    pub fn suggested_models(&self) -> &'static [&'static str] {
        match self {
            BackendKind::HostedKeyed => &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"],
            BackendKind::HostedKeyless => &[
                "microsoft/DialoGPT-medium",
                "microsoft/DialoGPT-large",
                "facebook/blenderbot-400M-distill",
                "gpt2-medium",
            ],
            BackendKind::LocalServer => &[
                "llama2",
                "llama2:13b",
                "codellama",
                "mistral",
                "neural-chat",
            ],
        }
    }

    /// All backend kinds, in display order.
    pub fn all() -> &'static [BackendKind] {
        &[
            BackendKind::HostedKeyed,
            BackendKind::HostedKeyless,
            BackendKind::LocalServer,
        ]
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::HostedKeyed => write!(f, "gemini"),
            BackendKind::HostedKeyless => write!(f, "huggingface"),
            BackendKind::LocalServer => write!(f, "ollama"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "hosted" | "keyed" => Ok(BackendKind::HostedKeyed),
            "huggingface" | "hf" | "free" | "keyless" => Ok(BackendKind::HostedKeyless),
            "ollama" | "local" => Ok(BackendKind::LocalServer),
            other => Err(Error::validation(format!(
                "unknown backend '{other}' (expected gemini, huggingface, or ollama)"
            ))),
        }
    }
}

/// A text-generation service reachable behind a uniform request/response
/// contract.
///
/// Implementations perform exactly one outbound HTTP request per call, with
/// no retries and no local state mutation. Timeouts are per-variant: the
/// local server sets an explicit ceiling, the hosted variants rely on the
/// HTTP client's defaults. Callers must not assume a uniform timeout.
#[async_trait::async_trait]
pub trait ResponseBackend: Send + Sync {
    /// Sends one prompt and returns one completion.
    ///
    /// # Errors
    ///
    /// Returns a typed [`Error`] classifying the failure as well as the
    /// backend can. Classification of remote error text is best effort; an
    /// unrecognized failure comes back as [`Error::Unknown`].
    async fn respond(
        &self,
        prompt: &str,
        model: &str,
        credential: Option<&str>,
    ) -> Result<String>;
}

/// Constructs the backend implementation for a kind.
pub fn backend_for(kind: BackendKind) -> Result<Box<dyn ResponseBackend>> {
    match kind {
        BackendKind::HostedKeyed => Ok(Box::new(GeminiBackend::new()?)),
        BackendKind::HostedKeyless => Ok(Box::new(HuggingFaceBackend::new()?)),
        BackendKind::LocalServer => Ok(Box::new(OllamaBackend::new()?)),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a loopback port and returns the
    /// base URL to reach it. The listener reads the full request (headers
    /// plus content-length body) before responding, then closes.
    pub(crate) async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(header_end) = find_header_end(&buf) {
                    let headers = String::from_utf8_lossy(&buf[..header_end]);
                    let content_length = headers
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            if name.eq_ignore_ascii_case("content-length") {
                                value.trim().parse::<usize>().ok()
                            } else {
                                None
                            }
                        })
                        .unwrap_or(0);
                    if buf.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.flush().await.unwrap();
        });

        format!("http://{addr}")
    }

    fn find_header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }
}
