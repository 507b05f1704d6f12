// Public modules
pub mod backend;
pub mod chat;
pub mod controller;
pub mod error;
pub mod render;
pub mod transcript;
pub mod validate;

// Re-exports
pub use backend::{BackendKind, GeminiBackend, HuggingFaceBackend, OllamaBackend, ResponseBackend};
pub use controller::{BackendConfig, ChatController, CredentialState, SessionState};
pub use error::{Error, Result};
pub use transcript::{Role, Transcript, Turn};
pub use validate::{ValidationFailure, ValidationResult, validate};
