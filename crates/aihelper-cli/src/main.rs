//! AIHelper CLI — entry point.
//!
//! # Commands
//!
//! - `aihelper generate -m PROMPT` — single-turn generation
//! - `aihelper template --name NAME -i INPUT` — generation from a built-in prompt
//! - `aihelper chat [-s SESSION] [--system PROMPT]` — interactive chat REPL
//! - `aihelper models` — list the model catalog

mod helpers;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use aihelper_core::config::{load_config, resolve_api_key};
use aihelper_core::{PredefinedPrompt, Provider, ProviderConfiguration};
use aihelper_providers::registry::find_spec;
use aihelper_providers::{create_client, AiClient};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// AIHelper — one client for OpenAI and Anthropic models
#[derive(Parser)]
#[command(name = "aihelper", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.aihelper/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provider override: openai | anthropic
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model selector override (e.g. gpt-4o-mini, Claude3_5_Haiku)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a reply to a single prompt
    Generate {
        /// Prompt text
        #[arg(short, long)]
        message: String,
    },

    /// Generate from a built-in prompt template
    Template {
        /// Template name: summarize | explain | blog-post | code-review
        #[arg(long)]
        name: String,

        /// Text appended to the template
        #[arg(short, long)]
        input: String,
    },

    /// Interactive multi-turn chat
    Chat {
        /// Session key
        #[arg(short, long, default_value = "cli:default")]
        session: String,

        /// System prompt for a new session
        #[arg(long)]
        system: Option<String>,
    },

    /// List known models
    Models,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    match &cli.command {
        Commands::Generate { message } => {
            let client = build_client(&cli)?;
            info!(model = client.model().wire_id, "single prompt");
            helpers::print_thinking();
            let result = client.generate(message).await;
            helpers::clear_thinking();
            helpers::print_response(client.model().wire_id, &result.context("generation failed")?);
        }
        Commands::Template { name, input } => {
            let prompt = PredefinedPrompt::from_key(name).ok_or_else(|| {
                let known: Vec<&str> = PredefinedPrompt::ALL.iter().map(|p| p.key()).collect();
                anyhow!("unknown template '{name}' (known: {})", known.join(", "))
            })?;
            let client = build_client(&cli)?;
            helpers::print_thinking();
            let result = client.generate_with_predefined(prompt, input).await;
            helpers::clear_thinking();
            helpers::print_response(client.model().wire_id, &result.context("generation failed")?);
        }
        Commands::Chat { session, system } => {
            let client = build_client(&cli)?;
            repl::run(client, session, system.as_deref()).await?;
        }
        Commands::Models => {
            let provider = cli.provider.as_deref().map(parse_provider).transpose()?;
            helpers::print_models(provider);
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────
// Client construction
// ─────────────────────────────────────────────

fn parse_provider(name: &str) -> Result<Provider> {
    Provider::parse(name).ok_or_else(|| anyhow!("unknown provider '{name}'"))
}

/// Load the config file, apply flag overrides, and build a client.
fn build_client(cli: &Cli) -> Result<Arc<dyn AiClient>> {
    let config = apply_flags(load_config(cli.config.as_deref()), cli)?;

    let spec = find_spec(config.provider)
        .with_context(|| format!("provider {} has no client implementation", config.provider))?;
    let api_key = resolve_api_key(config.provider)
        .with_context(|| format!("no API key for {}: {}", spec.display_name, spec.api_key_hint()))?;

    create_client(&api_key, config).context("failed to create AI client")
}

/// Apply `--provider` and `--model` on top of the loaded configuration.
fn apply_flags(mut config: ProviderConfiguration, cli: &Cli) -> Result<ProviderConfiguration> {
    if let Some(name) = &cli.provider {
        let provider = parse_provider(name)?;
        if provider != config.provider {
            // the configured model belongs to the old provider
            config.provider = provider;
            config.model.clear();
            config.system_instructions.clear();
        }
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    Ok(config)
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("aihelper=debug,aihelper_core=debug,aihelper_providers=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
