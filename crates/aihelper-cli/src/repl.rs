//! Interactive chat REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use std::sync::Arc;

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use aihelper_providers::AiClient;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Resets the current session.
const CLEAR_COMMAND: &str = "/clear";

/// Run the interactive REPL loop.
pub async fn run(client: Arc<dyn AiClient>, session: &str, system: Option<&str>) -> Result<()> {
    helpers::print_banner(client.provider(), client.model().wire_id, session);

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            // Ctrl-C / Ctrl-D
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        let _ = editor.add_history_entry(&input);

        if trimmed.eq_ignore_ascii_case(CLEAR_COMMAND) {
            client.sessions().clear(session).await;
            println!("Session cleared.\n");
            continue;
        }

        debug!(session, input = trimmed, "processing input");
        helpers::print_thinking();

        match client.chat(session, trimmed, system).await {
            Ok(reply) => {
                helpers::clear_thinking();
                helpers::print_response(client.model().wire_id, &reply);
            }
            Err(e) => {
                helpers::clear_thinking();
                eprintln!("\nError: {e}\n");
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// `~/.aihelper/history/chat_history`
fn history_path() -> std::path::PathBuf {
    aihelper_core::utils::get_data_path()
        .join("history")
        .join("chat_history")
}

fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}
