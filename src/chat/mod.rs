//! Chat application module for interactive conversations.
//!
//! This module provides the REPL glue on top of the polychat core. It
//! supports:
//!
//! - A scrolling transcript of the session
//! - Slash commands for session control
//! - Switching between the three backends at runtime
//! - Offline and live credential checks
//!
//! # Architecture
//!
//! The module is organized into two components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing

mod commands;
mod config;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
