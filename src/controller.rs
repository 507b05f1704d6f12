//! Session controller.
//!
//! [`ChatController`] orchestrates one conversational turn: credential
//! validation, dispatch to the selected backend, transcript update, and
//! error surfacing. One controller is constructed per session and owns that
//! session's transcript, backend configuration, and cached credential
//! verdict; there are no ambient globals and no cross-session sharing.

use crate::backend::{BackendKind, ResponseBackend, backend_for};
use crate::error::{Error, Result};
use crate::transcript::{Role, Transcript, Turn};
use crate::validate::{ValidationFailure, ValidationResult, validate};

/// Prompt used by the live credential test.
const TEST_PROMPT: &str = "Say hello";

/// Session-level backend configuration.
///
/// Owned by the controller for the lifetime of the session and replaced
/// wholesale on user edits; there is one active request at a time, so there
/// are no partial-mutation races.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// The selected backend variant.
    pub kind: BackendKind,
    /// The selected model identifier.
    pub model: String,
    /// The credential, for backends that require one.
    pub credential: Option<String>,
}

impl BackendConfig {
    /// Creates a configuration for a backend kind with its default model.
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            model: kind.default_model().to_string(),
            credential: None,
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the credential.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(BackendKind::LocalServer)
    }
}

/// Cached verdict of the last credential validation attempt.
///
/// Never persisted beyond the session. Recomputed whenever the credential
/// changes, when the selected backend changes (the prefix rule is
/// backend-specific), and on an explicit live test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialState {
    /// No credential has been supplied yet.
    Unchecked,
    /// The credential passed its most recent check.
    Valid,
    /// The credential failed its most recent check.
    Invalid(ValidationFailure),
}

impl CredentialState {
    /// Returns true if the credential passed its most recent check.
    pub fn is_valid(&self) -> bool {
        matches!(self, CredentialState::Valid)
    }

    fn from_result(result: &ValidationResult) -> Self {
        match result {
            ValidationResult::Valid => CredentialState::Valid,
            ValidationResult::Invalid(failure) => CredentialState::Invalid(failure.clone()),
        }
    }
}

/// Where the session is in its request cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No request in flight.
    Idle,
    /// Exactly one backend request in flight.
    AwaitingBackend,
}

/// Orchestrates validation, backend dispatch, and transcript updates for a
/// single session.
pub struct ChatController {
    backend: Box<dyn ResponseBackend>,
    transcript: Transcript,
    config: BackendConfig,
    credential_state: CredentialState,
    state: SessionState,
}

impl ChatController {
    /// Creates a controller for the configured backend kind.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let backend = backend_for(config.kind)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Creates a controller around an injected backend implementation.
    ///
    /// Useful for embedding the controller behind a different transport and
    /// for tests.
    ///
    /// # Example
    ///
    /// ```
    /// use polychat::{BackendConfig, BackendKind, ChatController, ResponseBackend, Result, Role};
    ///
    /// struct CannedBackend;
    ///
    /// #[async_trait::async_trait]
    /// impl ResponseBackend for CannedBackend {
    ///     async fn respond(&self, _: &str, _: &str, _: Option<&str>) -> Result<String> {
    ///         Ok("canned reply".to_string())
    ///     }
    /// }
    ///
    /// let mut controller = ChatController::with_backend(
    ///     BackendConfig::new(BackendKind::HostedKeyless),
    ///     Box::new(CannedBackend),
    /// );
    /// let turn = tokio_test::block_on(controller.submit("hi")).unwrap();
    /// assert_eq!(turn.role, Role::Assistant);
    /// assert_eq!(turn.content, "canned reply");
    /// ```
    pub fn with_backend(config: BackendConfig, backend: Box<dyn ResponseBackend>) -> Self {
        let credential_state = match &config.credential {
            Some(credential) => {
                CredentialState::from_result(&validate(credential, config.kind))
            }
            None => CredentialState::Unchecked,
        };
        Self {
            backend,
            transcript: Transcript::new(),
            config,
            credential_state,
            state: SessionState::Idle,
        }
    }

    /// Submits one user prompt and returns the resulting assistant turn.
    ///
    /// On acceptance this appends a `User` turn, dispatches to the selected
    /// backend, and appends exactly one `Assistant` turn: the completion
    /// text, or the human-readable rendering of the failure. Failures stay
    /// in the transcript as ordinary turns so it remains a complete audit
    /// trail, and the session returns to idle either way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without touching the transcript or the
    /// network when a request is already in flight, the trimmed prompt is
    /// empty, or the selected backend requires a credential that is not
    /// locally valid.
    ///
    /// Through `&mut self` the in-flight rejection can never fire: exclusive
    /// access already enforces one request at a time. The guard is kept for
    /// embeddings that drive the controller through interior mutability,
    /// where a second caller could otherwise observe [`SessionState::AwaitingBackend`].
    pub async fn submit(&mut self, prompt: &str) -> Result<Turn> {
        if self.state == SessionState::AwaitingBackend {
            return Err(Error::validation(
                "a request is already in flight; wait for it to finish",
            ));
        }

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::validation("prompt is empty"));
        }

        if self.config.kind.requires_credential() {
            match &self.credential_state {
                CredentialState::Valid => {}
                CredentialState::Unchecked => {
                    return Err(Error::validation(
                        "this backend requires an access key; set one first",
                    ));
                }
                CredentialState::Invalid(failure) => {
                    return Err(Error::validation(format!(
                        "access key failed validation: {failure}"
                    )));
                }
            }
        }

        let sequence = self.transcript.next_sequence();
        self.transcript
            .append(Turn::new(Role::User, prompt, sequence))?;

        self.state = SessionState::AwaitingBackend;
        let outcome = self
            .backend
            .respond(prompt, &self.config.model, self.config.credential.as_deref())
            .await;
        self.state = SessionState::Idle;

        let content = match outcome {
            Ok(text) => text,
            Err(err) => err.to_string(),
        };

        let sequence = self.transcript.next_sequence();
        let turn = Turn::new(Role::Assistant, content, sequence);
        self.transcript.append(turn.clone())?;
        Ok(turn)
    }

    /// Sets (or clears) the credential and recomputes its cached verdict.
    ///
    /// An empty or whitespace-only value clears the credential.
    pub fn set_credential(&mut self, raw: &str) -> &CredentialState {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.config.credential = None;
            self.credential_state = CredentialState::Unchecked;
        } else {
            self.config.credential = Some(trimmed.to_string());
            self.credential_state =
                CredentialState::from_result(&validate(trimmed, self.config.kind));
        }
        &self.credential_state
    }

    /// Performs one live round-trip to test the credential.
    ///
    /// The local shape check runs first; only a locally plausible credential
    /// is sent over the network. Network-side failures are reinterpreted
    /// into the same [`ValidationResult`] shape as local ones for uniform
    /// display. The cached [`CredentialState`] is updated either way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a request is already in flight.
    pub async fn test_credential(&mut self) -> Result<ValidationResult> {
        if self.state == SessionState::AwaitingBackend {
            return Err(Error::validation(
                "a request is already in flight; wait for it to finish",
            ));
        }

        let local = match &self.config.credential {
            Some(credential) => validate(credential, self.config.kind),
            None => ValidationResult::Invalid(ValidationFailure::EmptyCredential),
        };
        if !local.is_ok() {
            self.credential_state = CredentialState::from_result(&local);
            return Ok(local);
        }

        self.state = SessionState::AwaitingBackend;
        let outcome = self
            .backend
            .respond(
                TEST_PROMPT,
                &self.config.model,
                self.config.credential.as_deref(),
            )
            .await;
        self.state = SessionState::Idle;

        let result = match outcome {
            Ok(_) => ValidationResult::Valid,
            Err(err) => ValidationResult::from_backend_error(&err),
        };
        self.credential_state = CredentialState::from_result(&result);
        Ok(result)
    }

    /// Selects the model identifier for subsequent submissions.
    pub fn select_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
    }

    /// Switches to a different backend variant.
    ///
    /// The model resets to the new backend's default (model identifiers do
    /// not carry across services) and the credential verdict is recomputed
    /// under the new backend's rules.
    pub fn select_backend(&mut self, kind: BackendKind) -> Result<()> {
        if self.config.kind == kind {
            return Ok(());
        }
        self.backend = backend_for(kind)?;
        self.config.kind = kind;
        self.config.model = kind.default_model().to_string();
        self.credential_state = match &self.config.credential {
            Some(credential) => CredentialState::from_result(&validate(credential, kind)),
            None => CredentialState::Unchecked,
        };
        Ok(())
    }

    /// Wipes the transcript. Numbering restarts from zero.
    pub fn clear_history(&mut self) {
        self.transcript.clear();
    }

    /// Returns an ordered snapshot of the transcript.
    pub fn turns(&self) -> Vec<Turn> {
        self.transcript.all()
    }

    /// Returns the number of turns in the transcript.
    pub fn turn_count(&self) -> usize {
        self.transcript.len()
    }

    /// Returns true while a backend request is in flight.
    ///
    /// Callers should surface a working indicator for the duration and must
    /// not start a second submission before it resolves.
    pub fn busy(&self) -> bool {
        self.state == SessionState::AwaitingBackend
    }

    /// Returns the cached credential verdict.
    pub fn credential_state(&self) -> &CredentialState {
        &self.credential_state
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Scripted backend: pops one pre-arranged outcome per call and counts
    /// how many calls were made.
    struct MockBackend {
        outcomes: Mutex<VecDeque<Result<String>>>,
        calls: Arc<AtomicUsize>,
    }

    impl MockBackend {
        fn new(outcomes: Vec<Result<String>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Returns a handle that keeps counting after the mock is boxed up
        /// and handed to the controller.
        fn call_counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait::async_trait]
    impl ResponseBackend for MockBackend {
        async fn respond(
            &self,
            _prompt: &str,
            _model: &str,
            _credential: Option<&str>,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::unknown("mock exhausted")))
        }
    }

    fn keyless_controller(outcomes: Vec<Result<String>>) -> ChatController {
        ChatController::with_backend(
            BackendConfig::new(BackendKind::HostedKeyless),
            Box::new(MockBackend::new(outcomes)),
        )
    }

    fn valid_key() -> String {
        format!("AIza{}", "x".repeat(35))
    }

    #[tokio::test]
    async fn submit_appends_user_and_assistant_turns() {
        let mut controller = keyless_controller(vec![
            Ok("first reply".to_string()),
            Ok("second reply".to_string()),
        ]);

        let turn = controller.submit("hello there").await.unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, "first reply");
        assert_eq!(turn.sequence, 1);

        controller.submit("and again").await.unwrap();

        let turns = controller.turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "hello there");
        let sequences: Vec<u64> = turns.iter().map(|t| t.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
        assert!(!controller.busy());
    }

    #[tokio::test]
    async fn backend_failure_is_recorded_as_an_assistant_turn() {
        let mut controller = keyless_controller(vec![
            Err(Error::unknown("429 - rate limited")),
            Ok("recovered".to_string()),
        ]);

        let turn = controller.submit("hello").await.unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, "Error: 429 - rate limited");

        // Failure is not a sticky state: the next submit proceeds normally.
        let turn = controller.submit("try again").await.unwrap();
        assert_eq!(turn.content, "recovered");
        assert_eq!(controller.turn_count(), 4);
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_without_a_turn() {
        let mut controller = keyless_controller(vec![Ok("unused".to_string())]);

        let err = controller.submit("   ").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.turn_count(), 0);
    }

    #[tokio::test]
    async fn keyed_backend_blocks_submit_until_credential_is_valid() {
        let mock = MockBackend::new(vec![Ok("reply".to_string())]);
        let mut controller = ChatController::with_backend(
            BackendConfig::new(BackendKind::HostedKeyed),
            Box::new(mock),
        );

        // No credential at all.
        let err = controller.submit("hello").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.turn_count(), 0);

        // A locally implausible credential.
        controller.set_credential("nope");
        let err = controller.submit("hello").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.turn_count(), 0);

        // A plausible credential unblocks submission.
        controller.set_credential(&valid_key());
        assert!(controller.credential_state().is_valid());
        let turn = controller.submit("hello").await.unwrap();
        assert_eq!(turn.content, "reply");
        assert_eq!(controller.turn_count(), 2);
    }

    #[tokio::test]
    async fn blocked_submit_never_reaches_the_backend() {
        let mock = MockBackend::new(vec![Ok("unused".to_string())]);
        let calls = mock.call_counter();
        let mut controller = ChatController::with_backend(
            BackendConfig::new(BackendKind::HostedKeyed),
            Box::new(mock),
        );

        controller.set_credential("AIzaShort_");
        assert!(controller.submit("hello").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clear_history_restarts_sequence_numbering() {
        let mut controller = keyless_controller(vec![
            Ok("one".to_string()),
            Ok("two".to_string()),
        ]);

        controller.submit("first").await.unwrap();
        assert_eq!(controller.turn_count(), 2);

        controller.clear_history();
        assert!(controller.turns().is_empty());

        controller.submit("second").await.unwrap();
        let sequences: Vec<u64> = controller.turns().iter().map(|t| t.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_credential_short_circuits_on_local_failure() {
        let mock = MockBackend::new(vec![Ok("unused".to_string())]);
        let calls = mock.call_counter();
        let mut controller = ChatController::with_backend(
            BackendConfig::new(BackendKind::HostedKeyed),
            Box::new(mock),
        );

        controller.set_credential("BadPrefix1234567890123456789012345");
        let result = controller.test_credential().await.unwrap();
        assert_eq!(
            result,
            ValidationResult::Invalid(ValidationFailure::WrongPrefix)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_credential_reinterprets_remote_failures() {
        let mut controller = ChatController::with_backend(
            BackendConfig::new(BackendKind::HostedKeyed),
            Box::new(MockBackend::new(vec![
                Err(Error::invalid_credential("key was rejected")),
                Ok("hello!".to_string()),
            ])),
        );
        controller.set_credential(&valid_key());

        let result = controller.test_credential().await.unwrap();
        assert_eq!(
            result,
            ValidationResult::Invalid(ValidationFailure::Rejected(
                "Invalid credential: key was rejected".to_string()
            ))
        );
        assert!(!controller.credential_state().is_valid());

        // A later test can still pass; the verdict is a cache, not a latch.
        let result = controller.test_credential().await.unwrap();
        assert_eq!(result, ValidationResult::Valid);
        assert!(controller.credential_state().is_valid());
    }

    #[tokio::test]
    async fn select_backend_recomputes_the_credential_verdict() {
        let mut controller = keyless_controller(vec![]);
        // Plausible for keyless backends, wrong prefix for the keyed one.
        controller.set_credential("hf_0123456789012345678901234567890123456789");
        assert!(controller.credential_state().is_valid());

        controller.select_backend(BackendKind::HostedKeyed).unwrap();
        assert_eq!(
            controller.credential_state(),
            &CredentialState::Invalid(ValidationFailure::WrongPrefix)
        );
        assert_eq!(controller.config().model, "gemini-2.5-flash");

        controller.select_backend(BackendKind::LocalServer).unwrap();
        assert!(controller.credential_state().is_valid());
        assert_eq!(controller.config().model, "llama2");
    }

    #[tokio::test]
    async fn select_model_applies_to_subsequent_submissions() {
        let mut controller = keyless_controller(vec![Ok("ok".to_string())]);
        controller.select_model("gpt2-medium");
        assert_eq!(controller.config().model, "gpt2-medium");
        controller.submit("hello").await.unwrap();
    }
}
