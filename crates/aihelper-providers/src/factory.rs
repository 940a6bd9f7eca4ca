//! Client factory — validates a configuration and picks the right client.

use std::sync::Arc;

use tracing::info;

use aihelper_core::config::resolve_api_key;
use aihelper_core::utils::ensure_not_blank;
use aihelper_core::{AiError, ChatSessionStore, Provider, ProviderConfiguration, Result};

use crate::anthropic::AnthropicClient;
use crate::client::AiClient;
use crate::openai::OpenAiClient;
use crate::registry::{find_spec, resolve_model};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Builds provider clients.
///
/// By default every client gets its own pooled `reqwest` transport and its
/// own session store. Both can be injected, e.g. to share chat sessions
/// between clients or to script responses in tests.
#[derive(Default)]
pub struct ClientFactory {
    transport: Option<Arc<dyn HttpTransport>>,
    sessions: Option<Arc<ChatSessionStore>>,
}

impl ClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_sessions(mut self, sessions: Arc<ChatSessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Create a client for `config.provider`.
    pub fn create(
        &self,
        api_key: &str,
        config: Option<ProviderConfiguration>,
    ) -> Result<Arc<dyn AiClient>> {
        ensure_not_blank(api_key, "apiKey")?;
        let config = config.ok_or_else(|| AiError::invalid("configuration cannot be null"))?;

        if !matches!(config.provider, Provider::OpenAi | Provider::Anthropic) {
            return Err(AiError::UnsupportedProvider(config.provider));
        }
        config.validate()?;

        let model = resolve_model(config.model_selector())?;
        if model.provider != config.provider {
            return Err(AiError::invalid(format!(
                "model '{}' belongs to {}, not {}",
                model.wire_id, model.provider, config.provider
            )));
        }

        let transport = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(ReqwestTransport::new(&config)?),
        };
        let sessions = match &self.sessions {
            Some(sessions) => Arc::clone(sessions),
            None => Arc::new(ChatSessionStore::new(config.max_chat_history_size)),
        };

        info!(provider = %config.provider, model = model.wire_id, "creating AI client");

        let client: Arc<dyn AiClient> = match config.provider {
            Provider::OpenAi => Arc::new(OpenAiClient::new(api_key, config, model, transport, sessions)?),
            Provider::Anthropic => Arc::new(AnthropicClient::new(api_key, config, model, transport, sessions)?),
            other => return Err(AiError::UnsupportedProvider(other)),
        };
        Ok(client)
    }
}

/// Create a client with a fresh transport and session store.
pub fn create_client(api_key: &str, config: ProviderConfiguration) -> Result<Arc<dyn AiClient>> {
    ClientFactory::new().create(api_key, Some(config))
}

/// Create a client, reading the API key from the environment.
pub fn create_client_from_env(config: ProviderConfiguration) -> Result<Arc<dyn AiClient>> {
    let spec = find_spec(config.provider).ok_or(AiError::UnsupportedProvider(config.provider))?;
    let api_key = resolve_api_key(config.provider).ok_or_else(|| {
        AiError::invalid(format!(
            "no API key for {}; {}",
            spec.display_name,
            spec.api_key_hint()
        ))
    })?;
    create_client(&api_key, config)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::stub::ScriptedTransport;
    use aihelper_core::ChatMessage;

    fn factory() -> ClientFactory {
        ClientFactory::new().with_transport(Arc::new(ScriptedTransport::new([])))
    }

    #[test]
    fn test_blank_key_or_missing_config() {
        let err = factory()
            .create("  ", Some(ProviderConfiguration::openai("gpt-4o")))
            .err()
            .unwrap();
        assert!(matches!(err, AiError::InvalidArgument(msg) if msg.contains("apiKey")));

        let err = factory().create("sk", None).err().unwrap();
        assert!(matches!(err, AiError::InvalidArgument(_)));
    }

    #[test]
    fn test_cohere_is_unsupported() {
        let config = ProviderConfiguration {
            provider: Provider::Cohere,
            ..Default::default()
        };
        let err = factory().create("sk", Some(config)).err().unwrap();
        assert!(matches!(err, AiError::UnsupportedProvider(Provider::Cohere)));
    }

    #[test]
    fn test_creates_matching_client() {
        let openai = factory()
            .create("sk", Some(ProviderConfiguration::openai("GPT_4_1_Mini")))
            .unwrap();
        assert_eq!(openai.provider(), Provider::OpenAi);
        assert_eq!(openai.model().wire_id, "gpt-4.1-mini");

        let anthropic = factory()
            .create("sk", Some(ProviderConfiguration::anthropic("")))
            .unwrap();
        assert_eq!(anthropic.provider(), Provider::Anthropic);
        assert_eq!(anthropic.model().wire_id, "claude-3-sonnet-20240229");
    }

    #[test]
    fn test_model_provider_mismatch() {
        let mut config = ProviderConfiguration::openai("claude-3-opus");
        config.provider = Provider::OpenAi;
        let err = factory().create("sk", Some(config)).err().unwrap();
        assert!(matches!(err, AiError::InvalidArgument(msg) if msg.contains("claude-3-opus")));
    }

    #[test]
    fn test_unknown_model_and_invalid_config() {
        let err = factory()
            .create("sk", Some(ProviderConfiguration::openai("gpt-99")))
            .err()
            .unwrap();
        assert!(matches!(err, AiError::UnknownModel(_)));

        let config = ProviderConfiguration {
            temperature: 2.0,
            ..ProviderConfiguration::openai("gpt-4o")
        };
        let err = factory().create("sk", Some(config)).err().unwrap();
        assert!(matches!(err, AiError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_injected_session_store_is_shared() {
        let sessions = Arc::new(ChatSessionStore::new(10));
        sessions.append("shared", ChatMessage::user("hello")).await;

        let client = factory()
            .with_sessions(Arc::clone(&sessions))
            .create("sk", Some(ProviderConfiguration::anthropic("claude-3-haiku")))
            .unwrap();
        assert!(Arc::ptr_eq(client.sessions(), &sessions));
        assert_eq!(client.sessions().get("shared").await.len(), 1);
    }

    #[tokio::test]
    async fn test_client_history_cap_wins_over_injected_store() {
        let transport = Arc::new(ScriptedTransport::responses((1..=5).map(|i| {
            let body = format!(r#"{{"content":[{{"type":"text","text":"a{i}"}}]}}"#);
            (200, body)
        })));
        let sessions = Arc::new(ChatSessionStore::new(100));
        let config = ProviderConfiguration {
            max_chat_history_size: 2,
            ..ProviderConfiguration::anthropic("claude-3-haiku")
        };

        let client = ClientFactory::new()
            .with_transport(transport.clone())
            .with_sessions(Arc::clone(&sessions))
            .create("sk", Some(config))
            .unwrap();
        for i in 1..=5 {
            client.chat("s", &format!("q{i}"), None).await.unwrap();
        }

        let history = sessions.get("s").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "q5");
        for request in transport.requests() {
            let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
            assert!(body["messages"].as_array().unwrap().len() <= 2);
        }
        // the store's own cap is untouched for other users
        assert_eq!(sessions.max_history(), 100);
    }

    #[test]
    fn test_from_env_rejects_unimplemented_provider() {
        let config = ProviderConfiguration {
            provider: Provider::Cohere,
            ..Default::default()
        };
        let err = create_client_from_env(config).err().unwrap();
        assert!(matches!(err, AiError::UnsupportedProvider(Provider::Cohere)));
    }

    #[test]
    fn test_default_factory_builds_real_transport() {
        let client = create_client("sk", ProviderConfiguration::openai("gpt-4o")).unwrap();
        assert_eq!(client.config().request_timeout_ms, 10_000);
    }
}
