//! Session transcript storage.
//!
//! A [`Transcript`] is an ordered, append-only record of a single session's
//! conversation. Insertion order is display order is chronological order.
//! Turns are never edited or reordered; the only destructive operation is a
//! full [`Transcript::clear`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text entered by the user.
    User,
    /// Text produced by a backend, including rendered failures.
    Assistant,
}

/// One exchange unit in a conversation.
///
/// Immutable once created. Created by the controller on each user submission
/// (role `User`) and again on the backend reply (role `Assistant`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,
    /// The turn's text.
    pub content: String,
    /// Monotonic position within the transcript.
    pub sequence: u64,
}

impl Turn {
    /// Creates a new turn.
    pub fn new(role: Role, content: impl Into<String>, sequence: u64) -> Self {
        Self {
            role,
            content: content.into(),
            sequence,
        }
    }
}

/// An ordered, append-only sequence of [`Turn`]s.
///
/// Invariant: sequence numbers are strictly increasing. After a
/// [`Transcript::clear`] the numbering restarts at 0 rather than continuing
/// the prior count, so a cleared transcript is indistinguishable from a fresh
/// one.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    next_sequence: u64,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence number the next appended turn must carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Appends a turn.
    ///
    /// # Errors
    ///
    /// Fails only on an invariant violation: a sequence number that is not
    /// the expected next position. This should never occur under the
    /// single-writer discipline the controller maintains.
    pub fn append(&mut self, turn: Turn) -> Result<()> {
        if turn.sequence != self.next_sequence {
            return Err(Error::validation(format!(
                "turn sequence {} does not follow {}",
                turn.sequence, self.next_sequence
            )));
        }
        self.next_sequence = turn.sequence + 1;
        self.turns.push(turn);
        Ok(())
    }

    /// Returns a snapshot of all turns in order.
    ///
    /// The snapshot is an owned copy; internal storage is never exposed for
    /// mutation.
    pub fn all(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Returns the most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Returns the number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if the transcript has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Resets the transcript to empty. Irreversible.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_increasing_sequences() {
        let mut transcript = Transcript::new();
        for i in 0..4 {
            let seq = transcript.next_sequence();
            assert_eq!(seq, i);
            transcript
                .append(Turn::new(Role::User, format!("turn {i}"), seq))
                .unwrap();
        }
        let turns = transcript.all();
        assert_eq!(turns.len(), 4);
        for window in turns.windows(2) {
            assert!(window[0].sequence < window[1].sequence);
        }
    }

    #[test]
    fn append_rejects_out_of_order_sequence() {
        let mut transcript = Transcript::new();
        transcript
            .append(Turn::new(Role::User, "hello", 0))
            .unwrap();

        let stale = Turn::new(Role::Assistant, "dup", 0);
        let err = transcript.append(stale).unwrap_err();
        assert!(err.is_validation());

        let gap = Turn::new(Role::Assistant, "gap", 5);
        assert!(transcript.append(gap).is_err());

        // The failed appends left nothing behind.
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn clear_restarts_numbering_at_zero() {
        let mut transcript = Transcript::new();
        for i in 0..3 {
            transcript
                .append(Turn::new(Role::User, "x", i))
                .unwrap();
        }
        transcript.clear();
        assert!(transcript.is_empty());
        assert_eq!(transcript.next_sequence(), 0);

        transcript
            .append(Turn::new(Role::User, "fresh", 0))
            .unwrap();
        assert_eq!(transcript.all()[0].sequence, 0);
    }

    #[test]
    fn all_returns_a_snapshot() {
        let mut transcript = Transcript::new();
        transcript
            .append(Turn::new(Role::User, "hello", 0))
            .unwrap();
        let mut snapshot = transcript.all();
        snapshot.clear();
        assert_eq!(transcript.len(), 1);
    }
}
