//! Core types for AIHelper — providers, chat roles, and chat messages.
//!
//! Every provider speaks a `role` + `content` message format on the wire, so a
//! single [`ChatMessage`] serializes directly into both OpenAI and Anthropic
//! request bodies.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// A distinct LLM vendor / API family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI (GPT and o-series models).
    #[default]
    OpenAi,
    /// Anthropic (Claude models).
    Anthropic,
    /// Cohere. Declared for configuration compatibility; no client exists yet.
    Cohere,
}

impl Provider {
    /// Lowercase name used in config files and env vars.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Cohere => "cohere",
        }
    }

    /// Parse a provider name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "cohere" => Some(Provider::Cohere),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// Chat messages
// ─────────────────────────────────────────────

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message as sent on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// Ordered conversation history for one chat session.
pub type ChatHistory = Vec<ChatMessage>;

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
