//! Configuration types for the chat REPL.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration that seeds a session.

use arrrg_derive::CommandLine;

use crate::backend::BackendKind;
use crate::controller::BackendConfig;

/// Command-line arguments for the polychat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend to use.
    #[arrrg(optional, "Backend: gemini, huggingface, or ollama (default: ollama)", "BACKEND")]
    pub backend: Option<String>,

    /// Model identifier to use.
    #[arrrg(optional, "Model to use (default depends on backend)", "MODEL")]
    pub model: Option<String>,

    /// Access key for keyed backends.
    #[arrrg(optional, "Access key for the hosted keyed backend", "KEY")]
    pub key: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The backend variant to start with.
    pub kind: BackendKind,

    /// The model identifier to start with.
    pub model: String,

    /// The access key, if one was supplied.
    pub credential: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - Backend: the local model server
    /// - Model: the backend's default
    /// - Color: enabled
    pub fn new() -> Self {
        let kind = BackendKind::LocalServer;
        Self {
            kind,
            model: kind.default_model().to_string(),
            credential: None,
            use_color: true,
        }
    }

    /// Sets the backend variant and resets the model to its default.
    pub fn with_backend(mut self, kind: BackendKind) -> Self {
        self.kind = kind;
        self.model = kind.default_model().to_string();
        self
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the access key.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Converts into the controller's session configuration.
    pub fn backend_config(&self) -> BackendConfig {
        let mut config = BackendConfig::new(self.kind).with_model(self.model.clone());
        if let Some(credential) = &self.credential {
            config = config.with_credential(credential.clone());
        }
        config
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = crate::Error;

    fn try_from(args: ChatArgs) -> Result<Self, Self::Error> {
        let kind = match args.backend {
            Some(name) => name.parse::<BackendKind>()?,
            None => BackendKind::LocalServer,
        };
        let model = args
            .model
            .unwrap_or_else(|| kind.default_model().to_string());

        Ok(ChatConfig {
            kind,
            model,
            credential: args.key,
            use_color: !args.no_color,
        })
    }
}
