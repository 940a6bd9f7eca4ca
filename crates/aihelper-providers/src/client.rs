//! Provider client trait and the plumbing every client shares.
//!
//! A client owns one immutable [`ProviderConfiguration`], the resolved model,
//! a [`RetryEngine`] over a pooled transport, and a handle on the chat
//! session store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use aihelper_core::session::SessionLock;
use aihelper_core::utils::truncate_string;
use aihelper_core::{
    AiError, ChatSessionStore, PredefinedPrompt, Provider, ProviderConfiguration, Result,
    TemplateProvider,
};

use crate::registry::{find_spec, AuthStyle, ModelSpec, ProviderSpec};
use crate::request::{self, RequestInput, RequestPayload};
use crate::response::{self, ResponseShape};
use crate::retry::{RetryEngine, RetryPolicy};
use crate::transport::{HttpRequest, HttpTransport};

/// Bodies longer than this are cut when payload logging is on.
const PAYLOAD_LOG_LIMIT: usize = 2_000;

// ─────────────────────────────────────────────
// AiClient trait
// ─────────────────────────────────────────────

/// The operations every provider client exposes.
///
/// String inputs are checked for blankness before anything touches the
/// network; a blank input fails with [`AiError::InvalidArgument`].
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Single-turn generation from one prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Single-turn generation from a template and the user's input.
    async fn generate_with_template(&self, template: &str, input: &str) -> Result<String>;

    /// Single-turn generation from a template looked up in `templates`.
    async fn generate_with_dynamic_template(
        &self,
        templates: &dyn TemplateProvider,
        key: &str,
        input: &str,
    ) -> Result<String>;

    /// Multi-turn chat in the session named by `session_key`.
    ///
    /// `initial_system_prompt` only matters on the first call for a key; a
    /// blank or missing prompt falls back to the configured instructions.
    /// History is only updated when the call succeeds.
    async fn chat(
        &self,
        session_key: &str,
        user_message: &str,
        initial_system_prompt: Option<&str>,
    ) -> Result<String>;

    /// Generation from one of the built-in prompts.
    async fn generate_with_predefined(&self, prompt: PredefinedPrompt, input: &str) -> Result<String> {
        self.generate_with_template(prompt.text(), input).await
    }

    fn provider(&self) -> Provider;

    /// The resolved catalog entry this client sends to.
    fn model(&self) -> &'static ModelSpec;

    fn config(&self) -> &ProviderConfiguration;

    /// Chat histories this client reads and writes.
    fn sessions(&self) -> &Arc<ChatSessionStore>;
}

/// Bound a whole client call by `duration`.
///
/// When the deadline passes the inner future is dropped, which aborts the
/// HTTP call or retry sleep in flight and leaves chat history untouched.
pub async fn with_timeout<T, F>(duration: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| AiError::Timeout(duration))?
}

// ─────────────────────────────────────────────
// ClientCore — shared plumbing
// ─────────────────────────────────────────────

/// Everything a concrete client needs to turn a [`RequestInput`] into text.
pub(crate) struct ClientCore {
    pub(crate) config: ProviderConfiguration,
    pub(crate) model: &'static ModelSpec,
    pub(crate) sessions: Arc<ChatSessionStore>,
    spec: &'static ProviderSpec,
    api_key: String,
    api_base: String,
    engine: RetryEngine,
    shape: ResponseShape,
}

impl ClientCore {
    pub(crate) fn new(
        api_key: &str,
        config: ProviderConfiguration,
        model: &'static ModelSpec,
        transport: Arc<dyn HttpTransport>,
        sessions: Arc<ChatSessionStore>,
    ) -> Result<Self> {
        let spec = find_spec(config.provider).ok_or(AiError::UnsupportedProvider(config.provider))?;
        let shape = ResponseShape::for_provider(config.provider)?;
        let api_base = config
            .api_base
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .unwrap_or(spec.default_api_base)
            .trim_end_matches('/')
            .to_string();
        let engine = RetryEngine::new(transport, RetryPolicy::from_config(&config), config.provider);

        debug!(
            provider = spec.display_name,
            model = model.wire_id,
            api_base = %api_base,
            "created client"
        );

        Ok(Self {
            config,
            model,
            sessions,
            spec,
            api_key: api_key.trim().to_string(),
            api_base,
            engine,
            shape,
        })
    }

    /// Auth, version, and custom headers. Assembled fresh for each attempt.
    pub(crate) fn headers(&self) -> Vec<(String, String)> {
        let mut headers = match self.spec.auth {
            AuthStyle::Bearer => vec![(
                "Authorization".to_string(),
                format!("Bearer {}", self.api_key),
            )],
            AuthStyle::AnthropicKey => vec![
                ("x-api-key".to_string(), self.api_key.clone()),
                ("anthropic-version".to_string(), self.config.api_version.clone()),
            ],
        };

        let mut custom: Vec<_> = self
            .config
            .custom_headers
            .iter()
            .filter(|(name, _)| {
                let reserved = headers
                    .iter()
                    .any(|(auth, _)| auth.eq_ignore_ascii_case(name.trim()));
                if reserved {
                    warn!(header = %name, "skipping custom header that overrides authentication");
                }
                !reserved
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        custom.sort();
        headers.extend(custom);
        headers
    }

    /// Lock a chat session, capped by this client's configured history size.
    pub(crate) async fn lock_session(&self, key: &str) -> SessionLock {
        self.sessions
            .lock_with_limit(key, self.config.max_chat_history_size)
            .await
    }

    pub(crate) fn build(&self, input: RequestInput<'_>) -> Result<RequestPayload> {
        request::build(&self.config, self.model, input)
    }

    /// Dispatch `payload` through the retry engine and parse the reply.
    pub(crate) async fn send(&self, payload: &RequestPayload) -> Result<String> {
        let url = format!("{}{}", self.api_base, payload.endpoint());
        let body = payload.to_json()?;

        if self.config.log_payloads {
            debug!(url = %url, body = %truncate_string(&body, PAYLOAD_LOG_LIMIT), "request payload");
        } else {
            debug!(url = %url, bytes = body.len(), "sending request");
        }

        let raw = self
            .engine
            .execute(|| HttpRequest {
                url: url.clone(),
                headers: self.headers(),
                body: body.clone(),
            })
            .await?;

        if self.config.log_payloads {
            debug!(body = %truncate_string(&raw, PAYLOAD_LOG_LIMIT), "response payload");
        }

        response::parse(&raw, self.shape)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
