//! Slash command parsing for the chat REPL.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the session without sending messages to a
//! backend.

use crate::backend::BackendKind;

/// A parsed chat command.
///
/// These commands control the session and are never sent to a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Change the model identifier.
    Model(String),

    /// List the suggested models for the current backend.
    Models,

    /// Switch to a different backend.
    Backend(BackendKind),

    /// Set or clear the access key.
    /// `None` clears the current key.
    Key(Option<String>),

    /// Run one live round-trip to test the access key.
    TestKey,

    /// Display session statistics (turn count, current model, etc.).
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use polychat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model llama2:13b").is_some());
/// assert!(parse_command("Hello!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "models" => ChatCommand::Models,
        "backend" => match argument {
            Some(name) => match name.parse::<BackendKind>() {
                Ok(kind) => ChatCommand::Backend(kind),
                Err(err) => ChatCommand::Invalid(err.to_string()),
            },
            None => ChatCommand::Invalid(
                "/backend requires a name (gemini, huggingface, or ollama)".to_string(),
            ),
        },
        "key" => ChatCommand::Key(argument.map(|s| s.to_string())),
        "testkey" => ChatCommand::TestKey,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history
  /model <name>          Change the model (e.g., /model llama2:13b)
  /models                List suggested models for the current backend
  /backend <name>        Switch backend: gemini, huggingface, or ollama
  /key [value]           Set the access key (no argument clears it)
  /testkey               Test the access key with one live request
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}
