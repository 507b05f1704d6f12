//! Offline credential validation.
//!
//! The checks here are shape heuristics, not cryptographic validation: the
//! real authority is the remote service, which a local check cannot replace.
//! A [`ValidationResult::Valid`] verdict therefore only means "locally
//! plausible". The one live check, [`crate::ChatController::test_credential`],
//! reinterprets remote failures back into this module's result shape so that
//! local and remote verdicts display uniformly.

use std::fmt;

use crate::backend::BackendKind;
use crate::error::Error;

/// Minimum trimmed length below which a credential is treated as empty.
const MIN_CREDENTIAL_LEN: usize = 10;

/// Approximate expected credential length for the hosted keyed provider.
const EXPECTED_CREDENTIAL_LEN: usize = 35;

/// Fixed literal prefix for hosted keyed provider credentials.
const CREDENTIAL_PREFIX: &str = "AIza";

/// Why a credential failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The credential is missing or too short to be anything at all.
    EmptyCredential,

    /// The credential does not carry the provider's fixed prefix.
    WrongPrefix,

    /// The credential is shorter than the provider's token format allows.
    TooShort,

    /// A live test call was rejected by the remote service.
    ///
    /// Carries the rendered backend error so remote verdicts display the same
    /// way local ones do.
    Rejected(String),
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::EmptyCredential => {
                write!(f, "credential is empty or too short to be a key")
            }
            ValidationFailure::WrongPrefix => {
                write!(f, "credential does not start with '{CREDENTIAL_PREFIX}'")
            }
            ValidationFailure::TooShort => {
                write!(
                    f,
                    "credential is shorter than the expected {EXPECTED_CREDENTIAL_LEN} characters"
                )
            }
            ValidationFailure::Rejected(message) => {
                write!(f, "{message}")
            }
        }
    }
}

/// The outcome of a credential validation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    /// The credential is locally plausible. Not a guarantee the remote
    /// service will accept it.
    Valid,

    /// The credential failed validation for the given reason.
    Invalid(ValidationFailure),
}

impl ValidationResult {
    /// Returns true if the credential passed validation.
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Returns the failure reason, if any.
    pub fn reason(&self) -> Option<&ValidationFailure> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(failure) => Some(failure),
        }
    }

    /// Reinterprets a backend error from a live test call into a validation
    /// result, so network-side failures display uniformly with local ones.
    pub fn from_backend_error(err: &Error) -> Self {
        ValidationResult::Invalid(ValidationFailure::Rejected(err.to_string()))
    }
}

/// Validates a credential against local shape rules.
///
/// Rules are applied in order and the first failure wins:
///
/// 1. Surrounding whitespace is trimmed.
/// 2. A trimmed length below 10 fails with `EmptyCredential`.
/// 3. For [`BackendKind::HostedKeyed`] only, a value not starting with
///    `"AIza"` fails with `WrongPrefix`. Other backends skip this check.
/// 4. A trimmed length below 35 fails with `TooShort`.
///
/// The ordering is deliberate: because the length floor runs before the
/// prefix rule, a value shorter than 10 characters always reports
/// `EmptyCredential`, even when it starts with `"AIza"`. `TooShort` is only
/// reachable for values of 10 to 34 characters that pass the prefix rule.
///
/// This function never contacts the network.
pub fn validate(raw: &str, kind: BackendKind) -> ValidationResult {
    let trimmed = raw.trim();

    if trimmed.len() < MIN_CREDENTIAL_LEN {
        return ValidationResult::Invalid(ValidationFailure::EmptyCredential);
    }

    if kind == BackendKind::HostedKeyed && !trimmed.starts_with(CREDENTIAL_PREFIX) {
        return ValidationResult::Invalid(ValidationFailure::WrongPrefix);
    }

    if trimmed.len() < EXPECTED_CREDENTIAL_LEN {
        return ValidationResult::Invalid(ValidationFailure::TooShort);
    }

    ValidationResult::Valid
}
