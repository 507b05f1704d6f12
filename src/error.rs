//! Error types for the polychat core.
//!
//! This module defines one error type covering every failure the session can
//! observe: remote failures reported by a response backend, local validation
//! failures that block a submission, and HTTP client faults. Backend failures
//! are rendered into the transcript via their `Display` output, so the
//! messages here are written for end users, not logs.

use std::error;
use std::fmt;
use std::sync::Arc;

/// The main error type for polychat.
#[derive(Clone, Debug)]
pub enum Error {
    /// The credential was rejected by the remote service.
    InvalidCredential {
        /// Human-readable error message.
        message: String,
    },

    /// The credential is valid but lacks permission for the request.
    PermissionDenied {
        /// Human-readable error message.
        message: String,
    },

    /// The remote service's usage quota has been exhausted.
    QuotaExceeded {
        /// Human-readable error message.
        message: String,
    },

    /// The requested model identifier does not exist on the remote service.
    ModelNotFound {
        /// Human-readable error message.
        message: String,
        /// The model identifier that was requested.
        model: Option<String>,
    },

    /// The remote service could not authenticate the request.
    AuthenticationFailed {
        /// Human-readable error message.
        message: String,
    },

    /// The local server is not reachable at all.
    ///
    /// Distinct from [`Error::Unknown`]: the service was never started, as
    /// opposed to the service returning an error.
    ServerUnreachable {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// An unclassified backend failure.
    Unknown {
        /// Human-readable error message.
        message: String,
    },

    /// A submission was rejected before any backend call was made.
    Validation {
        /// Human-readable error message.
        message: String,
    },

    /// HTTP client error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new invalid-credential error.
    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Error::InvalidCredential {
            message: message.into(),
        }
    }

    /// Creates a new permission-denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Error::PermissionDenied {
            message: message.into(),
        }
    }

    /// Creates a new quota-exceeded error.
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Error::QuotaExceeded {
            message: message.into(),
        }
    }

    /// Creates a new model-not-found error.
    pub fn model_not_found(message: impl Into<String>, model: Option<String>) -> Self {
        Error::ModelNotFound {
            message: message.into(),
            model,
        }
    }

    /// Creates a new authentication-failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Error::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Creates a new server-unreachable error.
    pub fn server_unreachable(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::ServerUnreachable {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new unknown error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Error::Unknown {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Returns true if this error indicates a credential problem.
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            Error::InvalidCredential { .. } | Error::AuthenticationFailed { .. }
        )
    }

    /// Returns true if this error is a server-unreachable error.
    pub fn is_server_unreachable(&self) -> bool {
        matches!(self, Error::ServerUnreachable { .. })
    }

    /// Returns true if this error is an unclassified backend failure.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Error::Unknown { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCredential { message } => {
                write!(f, "Invalid credential: {message}")
            }
            Error::PermissionDenied { message } => {
                write!(f, "Permission denied: {message}")
            }
            Error::QuotaExceeded { message } => {
                write!(f, "Quota exceeded: {message}")
            }
            Error::ModelNotFound { message, model } => {
                if let Some(model) = model {
                    write!(f, "Model not found ({model}): {message}")
                } else {
                    write!(f, "Model not found: {message}")
                }
            }
            Error::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {message}")
            }
            Error::ServerUnreachable { message, .. } => {
                write!(f, "Server unreachable: {message}")
            }
            Error::Unknown { message } => {
                write!(f, "Error: {message}")
            }
            Error::Validation { message } => {
                write!(f, "Validation error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::ServerUnreachable { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::validation(format!("invalid base URL: {err}"))
    }
}

/// A specialized Result type for polychat operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renderings() {
        let err = Error::invalid_credential("key was rejected");
        assert_eq!(err.to_string(), "Invalid credential: key was rejected");

        let err = Error::model_not_found("no such model", Some("llama2:70b".to_string()));
        assert_eq!(
            err.to_string(),
            "Model not found (llama2:70b): no such model"
        );

        let err = Error::unknown("429 - too many requests");
        assert_eq!(err.to_string(), "Error: 429 - too many requests");
    }

    #[test]
    fn server_unreachable_is_distinct_from_unknown() {
        let unreachable = Error::server_unreachable("connection refused", None);
        assert!(unreachable.is_server_unreachable());
        assert!(!unreachable.is_unknown());

        let unknown = Error::unknown("500 Internal Server Error");
        assert!(unknown.is_unknown());
        assert!(!unknown.is_server_unreachable());
    }

    #[test]
    fn credential_predicate() {
        assert!(Error::invalid_credential("x").is_credential());
        assert!(Error::authentication_failed("x").is_credential());
        assert!(!Error::quota_exceeded("x").is_credential());
    }
}
