//! Error taxonomy shared by every AIHelper crate.

use std::time::Duration;

use thiserror::Error;

use crate::types::Provider;

/// Errors that can occur while building, sending, or parsing an LLM request.
///
/// Every error is scoped to the call that produced it; none is fatal to the
/// process.
#[derive(Debug, Error)]
pub enum AiError {
    /// Blank or missing input, or a configuration value out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The model selector is not in the registry.
    #[error("unknown model: '{0}'")]
    UnknownModel(String),

    /// The model cannot take a multi-turn `messages` array.
    #[error(
        "model '{0}' is not a chat-capable model; use a chat-supported model \
         (e.g. gpt-4o, gpt-4.1, o1, o3-mini)"
    )]
    UnsupportedModelForChat(String),

    /// The configured provider has no client implementation.
    #[error("unsupported AI provider: {0}")]
    UnsupportedProvider(Provider),

    /// A prompt template key has no registered template.
    #[error("prompt template '{0}' not found")]
    TemplateNotFound(String),

    /// Non-retriable 4xx response (anything but 429).
    #[error("{provider} API error: HTTP {status}: {body}")]
    TerminalHttp {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// Transient failures persisted through every allowed attempt.
    #[error("exceeded maximum retry attempts ({attempts}): {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The provider answered, but not in a shape we understand.
    #[error("unexpected response format: {0}")]
    MalformedResponse(String),

    /// The caller-supplied deadline elapsed before the call completed.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The HTTP client could not be constructed (bad proxy, TLS setup).
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

impl AiError {
    /// Shorthand for an [`AiError::InvalidArgument`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        AiError::InvalidArgument(msg.into())
    }

    /// Whether this error came from configuration rather than the remote service.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AiError::InvalidArgument(_)
                | AiError::UnknownModel(_)
                | AiError::UnsupportedModelForChat(_)
                | AiError::UnsupportedProvider(_)
                | AiError::ClientSetup(_)
        )
    }
}

/// Result alias used across AIHelper.
pub type Result<T> = std::result::Result<T, AiError>;
