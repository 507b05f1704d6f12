//! Interactive chat application with switchable backends.
//!
//! This binary provides a REPL for chatting with a hosted keyed model, a
//! free hosted inference endpoint, or a locally running model server.
//!
//! # Usage
//!
//! ```bash
//! # Chat against a local Ollama server (the default)
//! polychat
//!
//! # Use the hosted keyed backend with a key
//! polychat --backend gemini --key AIza...
//!
//! # Pick a model
//! polychat --backend ollama --model mistral
//!
//! # Disable colors (useful for piping output)
//! polychat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/backend <name>` - Switch backend
//! - `/model <name>` - Change the model
//! - `/key [value]` - Set or clear the access key
//! - `/testkey` - Test the access key with one live request
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use polychat::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, help_text, parse_command,
};
use polychat::{ChatController, CredentialState, ValidationResult};

/// Main entry point for the polychat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("polychat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    let use_color = config.use_color;

    let mut controller = ChatController::new(config.backend_config())?;
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // A SIGINT during an in-flight request should not kill the process;
    // there is no cancellation, so the request is left to finish.
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!(
        "polychat (backend: {}, model: {})",
        controller.config().kind,
        controller.config().model
    );
    println!("Type /help for commands, /quit to exit\n");

    loop {
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            controller.clear_history();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Model(model) => {
                            controller.select_model(model.clone());
                            renderer.print_info(&format!("Model changed to: {}", model));
                        }
                        ChatCommand::Models => {
                            print_models(&controller);
                        }
                        ChatCommand::Backend(kind) => match controller.select_backend(kind) {
                            Ok(()) => renderer.print_info(&format!(
                                "Backend changed to: {} (model: {})",
                                kind,
                                controller.config().model
                            )),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Key(value) => {
                            let state = controller.set_credential(value.as_deref().unwrap_or(""));
                            match state {
                                CredentialState::Unchecked => {
                                    renderer.print_info("Access key cleared.")
                                }
                                CredentialState::Valid => {
                                    renderer.print_info("Access key looks plausible. Use /testkey to verify it.")
                                }
                                CredentialState::Invalid(failure) => {
                                    renderer.print_error(&format!("Access key rejected: {failure}"))
                                }
                            }
                        }
                        ChatCommand::TestKey => {
                            renderer.print_busy();
                            match controller.test_credential().await {
                                Ok(ValidationResult::Valid) => {
                                    renderer.print_info("Access key works.")
                                }
                                Ok(ValidationResult::Invalid(failure)) => {
                                    renderer.print_error(&format!("Access key failed: {failure}"))
                                }
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&controller);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&controller);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the backend
                renderer.print_busy();
                match controller.submit(line).await {
                    Ok(turn) => renderer.print_turn(&turn),
                    Err(err) => renderer.print_error(&err.to_string()),
                }
                if interrupted.load(Ordering::Relaxed) {
                    renderer.print_info("(interrupt ignored; requests cannot be cancelled)");
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_models(controller: &ChatController) {
    let kind = controller.config().kind;
    println!("    Suggested models for {}:", kind);
    for model in kind.suggested_models() {
        if *model == controller.config().model {
            println!("      - {} (current)", model);
        } else {
            println!("      - {}", model);
        }
    }
}

fn print_stats(controller: &ChatController) {
    println!("    Session Statistics:");
    println!("      Backend: {}", controller.config().kind);
    println!("      Model: {}", controller.config().model);
    println!("      Turns: {}", controller.turn_count());
    println!("      Access key: {}", describe_credential(controller));
}

fn print_config(controller: &ChatController) {
    println!("    Current Configuration:");
    println!("      Backend: {}", controller.config().kind);
    println!("      Model: {}", controller.config().model);
    println!(
        "      Requires key: {}",
        if controller.config().kind.requires_credential() {
            "yes"
        } else {
            "no"
        }
    );
    println!("      Access key: {}", describe_credential(controller));
}

fn describe_credential(controller: &ChatController) -> String {
    match controller.credential_state() {
        CredentialState::Unchecked => "(not set)".to_string(),
        CredentialState::Valid => "set, looks plausible".to_string(),
        CredentialState::Invalid(failure) => format!("set, but invalid: {failure}"),
    }
}
