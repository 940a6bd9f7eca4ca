//! Request builder — turns a configuration, a resolved model, and a prompt or
//! conversation into the JSON body a provider expects.
//!
//! OpenAI-shaped requests come in two flavours: chat completions (a
//! `messages` array) for chat-capable models, and legacy completions (a
//! `prompt` string) for everything else. Anthropic always gets a `messages`
//! array with a top-level `system` field.

use serde::Serialize;

use aihelper_core::{AiError, ChatMessage, Provider, ProviderConfiguration, Result};

use crate::registry::ModelSpec;

// ─────────────────────────────────────────────
// Model capability predicates
// ─────────────────────────────────────────────

const CHAT_PREFIXES: &[&str] = &["gpt-", "chatgpt-", "o1", "o3", "o4"];
const REASONING_PREFIXES: &[&str] = &["o1", "o3", "o4"];

/// Whether an OpenAI wire identifier accepts a `messages` array.
pub fn is_chat_model(wire_id: &str) -> bool {
    let id = wire_id.to_lowercase();
    CHAT_PREFIXES.iter().any(|prefix| id.starts_with(prefix))
}

/// Whether an OpenAI wire identifier is a reasoning model
/// (`max_completion_tokens`, no sampling controls).
pub fn is_reasoning_model(wire_id: &str) -> bool {
    let id = wire_id.to_lowercase();
    REASONING_PREFIXES.iter().any(|prefix| id.starts_with(prefix))
}

/// Fail with [`AiError::UnsupportedModelForChat`] unless `model` can chat.
///
/// Every Anthropic model is served by the messages API.
pub fn ensure_chat_model(model: &ModelSpec) -> Result<()> {
    match model.provider {
        Provider::Anthropic => Ok(()),
        _ if is_chat_model(model.wire_id) => Ok(()),
        _ => Err(AiError::UnsupportedModelForChat(model.wire_id.to_string())),
    }
}

/// Join a template and the user's input the way template calls expect.
pub fn compose_template(template: &str, input: &str) -> String {
    format!("{template}\n{input}")
}

// ─────────────────────────────────────────────
// Wire payloads
// ─────────────────────────────────────────────

/// `POST /chat/completions` body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpenAiChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

/// `POST /completions` body (legacy, non-chat models).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpenAiCompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

/// `POST /messages` body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub system: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

/// A provider-specific request body, built fresh for every call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestPayload {
    OpenAiChat(OpenAiChatRequest),
    OpenAiCompletion(OpenAiCompletionRequest),
    Anthropic(AnthropicRequest),
}

impl RequestPayload {
    /// Path appended to the provider's API base.
    pub fn endpoint(&self) -> &'static str {
        match self {
            RequestPayload::OpenAiChat(_) => "/chat/completions",
            RequestPayload::OpenAiCompletion(_) => "/completions",
            RequestPayload::Anthropic(_) => "/messages",
        }
    }

    /// Serialized JSON body.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AiError::invalid(format!("failed to serialize request: {e}")))
    }
}

// ─────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────

/// What the caller wants to send.
#[derive(Clone, Copy, Debug)]
pub enum RequestInput<'a> {
    /// A single prompt, sent as one user message (or a `prompt` string).
    Prompt(&'a str),
    /// A prompt with a call-specific system prompt.
    PromptWithSystem { prompt: &'a str, system: &'a str },
    /// A full conversation, oldest first, with an optional out-of-band
    /// system prompt.
    Conversation {
        messages: &'a [ChatMessage],
        system: Option<&'a str>,
    },
}

/// Build the provider payload for `input`.
pub fn build(
    config: &ProviderConfiguration,
    model: &ModelSpec,
    input: RequestInput<'_>,
) -> Result<RequestPayload> {
    match model.provider {
        Provider::OpenAi => Ok(build_openai(config, model.wire_id, input)),
        Provider::Anthropic => Ok(RequestPayload::Anthropic(build_anthropic(
            config,
            model.wire_id,
            input,
        ))),
        other => Err(AiError::UnsupportedProvider(other)),
    }
}

fn build_openai(config: &ProviderConfiguration, wire_id: &str, input: RequestInput<'_>) -> RequestPayload {
    if !is_chat_model(wire_id) {
        return RequestPayload::OpenAiCompletion(OpenAiCompletionRequest {
            model: wire_id.to_string(),
            prompt: flatten_prompt(input),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        });
    }

    let messages = match input {
        RequestInput::Prompt(prompt) => vec![ChatMessage::user(prompt)],
        RequestInput::PromptWithSystem { prompt, system } => {
            vec![ChatMessage::system(system), ChatMessage::user(prompt)]
        }
        RequestInput::Conversation { messages, system } => {
            let leading_system = messages.first().is_some_and(ChatMessage::is_system);
            match system.filter(|s| !s.trim().is_empty()) {
                Some(system) if !leading_system => std::iter::once(ChatMessage::system(system))
                    .chain(messages.iter().cloned())
                    .collect(),
                _ => messages.to_vec(),
            }
        }
    };

    if is_reasoning_model(wire_id) {
        RequestPayload::OpenAiChat(OpenAiChatRequest {
            model: wire_id.to_string(),
            messages,
            max_tokens: None,
            max_completion_tokens: Some(config.max_tokens),
            temperature: None,
            top_p: None,
        })
    } else {
        RequestPayload::OpenAiChat(OpenAiChatRequest {
            model: wire_id.to_string(),
            messages,
            max_tokens: Some(config.max_tokens),
            max_completion_tokens: None,
            temperature: Some(config.temperature),
            top_p: Some(config.top_p),
        })
    }
}

fn build_anthropic(config: &ProviderConfiguration, wire_id: &str, input: RequestInput<'_>) -> AnthropicRequest {
    let (messages, system) = match input {
        RequestInput::Prompt(prompt) => (vec![ChatMessage::user(prompt)], None),
        RequestInput::PromptWithSystem { prompt, system } => {
            (vec![ChatMessage::user(prompt)], Some(system))
        }
        RequestInput::Conversation { messages, system } => {
            // Anthropic takes the system prompt out of band
            let system = system.filter(|s| !s.trim().is_empty()).or_else(|| {
                messages
                    .iter()
                    .find(|m| m.is_system())
                    .map(|m| m.content.as_str())
            });
            let messages = messages.iter().filter(|m| !m.is_system()).cloned().collect();
            (messages, system)
        }
    };

    let system = system
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.effective_system_instructions());

    AnthropicRequest {
        model: wire_id.to_string(),
        messages,
        system: system.to_string(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        top_p: config.top_p,
        stop_sequences: config.stop_sequences.clone(),
    }
}

fn flatten_prompt(input: RequestInput<'_>) -> String {
    match input {
        RequestInput::Prompt(prompt) => prompt.to_string(),
        RequestInput::PromptWithSystem { prompt, system } => compose_template(system, prompt),
        RequestInput::Conversation { messages, .. } => messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
