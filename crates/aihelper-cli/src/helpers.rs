//! Shared CLI helpers — response printing, banner, model listing.

use colored::Colorize;

use aihelper_core::Provider;
use aihelper_providers::registry::{find_spec, models_for};

/// Print a model reply to stdout.
pub fn print_response(model: &str, response: &str) {
    println!();
    println!("{}", model.cyan().bold());
    if response.trim().is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner(provider: Provider, model: &str, session: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "AIHelper".cyan().bold(), version.dimmed());
    println!("{} {} · session {}", provider.to_string().green(), model, session.yellow());
    println!(
        "{}",
        "Type a message, \"/clear\" to reset the session, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder.
pub fn print_thinking() {
    eprint!("{}", "thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// List catalog entries, optionally for one provider.
pub fn print_models(provider: Option<Provider>) {
    let providers = match provider {
        Some(p) => vec![p],
        None => vec![Provider::OpenAi, Provider::Anthropic],
    };

    for provider in providers {
        let title = find_spec(provider)
            .map(|spec| spec.display_name.to_string())
            .unwrap_or_else(|| provider.to_string());
        println!("{}", title.bold());

        let mut count = 0;
        for spec in models_for(provider) {
            count += 1;
            println!("  {:<44} {}", spec.wire_id, spec.aliases.join(", ").dimmed());
        }
        if count == 0 {
            println!("  {}", "(no models)".dimmed());
        }
        println!();
    }
}
