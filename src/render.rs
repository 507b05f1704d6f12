//! Output rendering for the chat REPL.
//!
//! This module provides a renderer trait and a plain-text implementation.
//! The abstraction allows different rendering strategies: ANSI-styled text,
//! unstyled text for piping/redirecting, or a TUI.

use std::io::{self, Write};

use crate::transcript::{Role, Turn};

/// ANSI escape code for dim text (used for informational messages).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for user turns).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print a completed turn of the conversation.
    fn print_turn(&mut self, turn: &Turn);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Show a working indicator while a backend request is in flight.
    fn print_busy(&mut self);
}

/// A plain-text renderer that writes to stdout, with optional ANSI styling.
pub struct PlainTextRenderer {
    use_color: bool,
    stdout: io::Stdout,
}

impl PlainTextRenderer {
    /// Creates a renderer with ANSI styling enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a renderer with styling set explicitly.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            use_color,
            stdout: io::stdout(),
        }
    }

    fn styled(&self, code: &str, text: &str) -> String {
        if self.use_color {
            format!("{code}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_turn(&mut self, turn: &Turn) {
        let label = match turn.role {
            Role::User => self.styled(ANSI_CYAN, "You"),
            Role::Assistant => "Assistant".to_string(),
        };
        let _ = writeln!(self.stdout, "{}: {}", label, turn.content);
    }

    fn print_error(&mut self, error: &str) {
        let line = self.styled(ANSI_RED, error);
        let _ = writeln!(self.stdout, "{line}");
    }

    fn print_info(&mut self, info: &str) {
        let line = self.styled(ANSI_DIM, info);
        let _ = writeln!(self.stdout, "{line}");
    }

    fn print_busy(&mut self) {
        let line = self.styled(ANSI_DIM, "Thinking...");
        let _ = writeln!(self.stdout, "{line}");
        let _ = self.stdout.flush();
    }
}
