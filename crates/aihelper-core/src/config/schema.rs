//! Configuration schema — one immutable settings object per provider client.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::types::Provider;

/// Default system instructions for OpenAI-shaped clients.
pub const DEFAULT_OPENAI_INSTRUCTIONS: &str = "You are an AI assistant.";

/// Default system prompt for Anthropic clients.
pub const DEFAULT_ANTHROPIC_SYSTEM_PROMPT: &str =
    "You are Claude, an AI assistant created by Anthropic.";

/// Default `anthropic-version` header value.
pub const DEFAULT_ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Default model selector for a provider, used when the config leaves `model` blank.
pub fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "gpt-3.5-turbo",
        Provider::Anthropic => "claude-3-sonnet-20240229",
        Provider::Cohere => "command",
    }
}

// ─────────────────────────────────────────────
// Proxy
// ─────────────────────────────────────────────

/// HTTP proxy that all provider traffic is routed through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

impl ProxyConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Proxy URL. A bare host gets an `http://` scheme.
    pub fn url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.contains("://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }
}

// ─────────────────────────────────────────────
// ProviderConfiguration
// ─────────────────────────────────────────────

/// Settings for one provider client.
///
/// Created once per client and never mutated afterwards: clients take it by
/// value and only hand out shared references.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfiguration {
    /// Provider this configuration targets.
    pub provider: Provider,
    /// Model selector resolved through the model registry. Blank = provider default.
    pub model: String,
    /// Maximum tokens per response (> 0).
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f64,
    /// Nucleus sampling (0.0 – 1.0).
    pub top_p: f64,
    /// Per-attempt HTTP timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum number of attempts for one request.
    pub max_retry_count: u32,
    /// Delay between attempts after a transient failure, in milliseconds.
    pub retry_delay_ms: u64,
    /// Extra HTTP headers sent with every request.
    pub custom_headers: HashMap<String, String>,
    /// Optional HTTP proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    /// Maximum messages kept per chat session (> 0).
    pub max_chat_history_size: usize,
    /// Default system instructions. Blank = provider default.
    pub system_instructions: String,
    /// `anthropic-version` header value (Anthropic only).
    pub api_version: String,
    /// Stop sequences (Anthropic only). Omitted from requests when empty.
    pub stop_sequences: Vec<String>,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Log outgoing request and raw response bodies at debug level.
    pub log_payloads: bool,
}

impl Default for ProviderConfiguration {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: String::new(),
            max_tokens: 150,
            temperature: 0.7,
            top_p: 1.0,
            request_timeout_ms: 10_000,
            max_retry_count: 3,
            retry_delay_ms: 2_000,
            custom_headers: HashMap::new(),
            proxy: None,
            max_chat_history_size: 20,
            system_instructions: String::new(),
            api_version: DEFAULT_ANTHROPIC_API_VERSION.to_string(),
            stop_sequences: Vec::new(),
            api_base: None,
            log_payloads: false,
        }
    }
}

impl ProviderConfiguration {
    /// OpenAI configuration for the given model selector.
    pub fn openai(model: impl Into<String>) -> Self {
        Self {
            provider: Provider::OpenAi,
            model: model.into(),
            system_instructions: DEFAULT_OPENAI_INSTRUCTIONS.to_string(),
            ..Default::default()
        }
    }

    /// Anthropic configuration for the given model selector.
    pub fn anthropic(model: impl Into<String>) -> Self {
        Self {
            provider: Provider::Anthropic,
            model: model.into(),
            system_instructions: DEFAULT_ANTHROPIC_SYSTEM_PROMPT.to_string(),
            ..Default::default()
        }
    }

    /// The model selector, falling back to the provider default when blank.
    pub fn model_selector(&self) -> &str {
        let model = self.model.trim();
        if model.is_empty() {
            default_model(self.provider)
        } else {
            model
        }
    }

    /// System instructions, falling back to the provider default when blank.
    pub fn effective_system_instructions(&self) -> &str {
        if !self.system_instructions.trim().is_empty() {
            return &self.system_instructions;
        }
        match self.provider {
            Provider::Anthropic => DEFAULT_ANTHROPIC_SYSTEM_PROMPT,
            _ => DEFAULT_OPENAI_INSTRUCTIONS,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Check the invariants every client relies on.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(AiError::invalid("maxTokens must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(AiError::invalid(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(AiError::invalid(format!(
                "topP must be within [0, 1], got {}",
                self.top_p
            )));
        }
        if self.max_chat_history_size == 0 {
            return Err(AiError::invalid("maxChatHistorySize must be greater than 0"));
        }
        if self.request_timeout_ms == 0 {
            return Err(AiError::invalid("requestTimeoutMs must be greater than 0"));
        }
        if let Some(proxy) = &self.proxy {
            if proxy.host.trim().is_empty() || proxy.port == 0 {
                return Err(AiError::invalid(format!(
                    "proxy requires a host and a non-zero port, got {}:{}",
                    proxy.host, proxy.port
                )));
            }
        }
        if self.provider == Provider::Anthropic && self.api_version.trim().is_empty() {
            return Err(AiError::invalid("apiVersion is required for Anthropic"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
