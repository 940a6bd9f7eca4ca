//! Anthropic client — the messages API.
//!
//! Chat histories hold only user and assistant turns; the system prompt
//! travels in the top-level `system` field of every request instead.

use std::sync::Arc;

use async_trait::async_trait;

use aihelper_core::session::truncate_history;
use aihelper_core::utils::ensure_not_blank;
use aihelper_core::{
    ChatHistory, ChatMessage, ChatSessionStore, Provider, ProviderConfiguration, Result, Role,
    TemplateProvider,
};

use crate::client::{AiClient, ClientCore};
use crate::registry::ModelSpec;
use crate::request::{compose_template, RequestInput};
use crate::transport::HttpTransport;

/// Drop leading turns until the conversation opens with a user message.
///
/// Evicting an odd number of messages from a user/assistant history leaves
/// an assistant turn first, which the messages API rejects.
fn open_with_user_turn(history: &mut ChatHistory) {
    let first_user = history
        .iter()
        .position(|m| m.role == Role::User)
        .unwrap_or(history.len());
    history.drain(..first_user);
}

pub struct AnthropicClient {
    core: ClientCore,
}

impl AnthropicClient {
    pub(crate) fn new(
        api_key: &str,
        config: ProviderConfiguration,
        model: &'static ModelSpec,
        transport: Arc<dyn HttpTransport>,
        sessions: Arc<ChatSessionStore>,
    ) -> Result<Self> {
        Ok(Self {
            core: ClientCore::new(api_key, config, model, transport, sessions)?,
        })
    }
}

#[async_trait]
impl AiClient for AnthropicClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        ensure_not_blank(prompt, "prompt")?;
        let payload = self.core.build(RequestInput::Prompt(prompt))?;
        self.core.send(&payload).await
    }

    async fn generate_with_template(&self, template: &str, input: &str) -> Result<String> {
        ensure_not_blank(template, "template")?;
        ensure_not_blank(input, "input")?;
        let prompt = compose_template(template, input);
        let payload = self.core.build(RequestInput::Prompt(&prompt))?;
        self.core.send(&payload).await
    }

    /// The template becomes the system prompt and the input the only user turn.
    async fn generate_with_dynamic_template(
        &self,
        templates: &dyn TemplateProvider,
        key: &str,
        input: &str,
    ) -> Result<String> {
        ensure_not_blank(key, "promptKey")?;
        ensure_not_blank(input, "input")?;
        let template = templates.get(key)?;
        ensure_not_blank(&template, "template")?;
        let payload = self.core.build(RequestInput::PromptWithSystem {
            prompt: input,
            system: &template,
        })?;
        self.core.send(&payload).await
    }

    async fn chat(
        &self,
        session_key: &str,
        user_message: &str,
        initial_system_prompt: Option<&str>,
    ) -> Result<String> {
        ensure_not_blank(session_key, "sessionKey")?;
        ensure_not_blank(user_message, "userMessage")?;

        let session = self.core.lock_session(session_key).await;
        let mut history = session.staged([ChatMessage::user(user_message)]);
        open_with_user_turn(&mut history);

        let payload = self.core.build(RequestInput::Conversation {
            messages: &history,
            system: initial_system_prompt,
        })?;
        let reply = self.core.send(&payload).await?;

        history.push(ChatMessage::assistant(reply.clone()));
        truncate_history(&mut history, session.max_history());
        open_with_user_turn(&mut history);
        session.commit(history);
        Ok(reply)
    }

    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn model(&self) -> &'static ModelSpec {
        self.core.model
    }

    fn config(&self) -> &ProviderConfiguration {
        &self.core.config
    }

    fn sessions(&self) -> &Arc<ChatSessionStore> {
        &self.core.sessions
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use aihelper_core::config::schema::DEFAULT_ANTHROPIC_SYSTEM_PROMPT;
    use aihelper_core::{AiError, DynamicPromptStore};
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::registry::resolve_model;
    use crate::transport::stub::ScriptedTransport;
    use crate::transport::ReqwestTransport;

    fn text_reply(text: &str) -> (u16, String) {
        let body = json!({
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}]
        });
        (200, body.to_string())
    }

    fn client_with(config: ProviderConfiguration, transport: Arc<dyn HttpTransport>) -> AnthropicClient {
        let model = resolve_model(config.model_selector()).unwrap();
        let sessions = Arc::new(ChatSessionStore::new(config.max_chat_history_size));
        AnthropicClient::new("sk-ant", config, model, transport, sessions).unwrap()
    }

    fn sent_body(transport: &ScriptedTransport, index: usize) -> Value {
        serde_json::from_str(&transport.requests()[index].body).unwrap()
    }

    #[tokio::test]
    async fn test_dynamic_template_goes_to_system() {
        let transport = Arc::new(ScriptedTransport::responses([text_reply("Bonjour")]));
        let client = client_with(ProviderConfiguration::anthropic("claude-3-haiku"), transport.clone());

        let mut store = DynamicPromptStore::new();
        store.add("french", "Translate to French:");
        let reply = client
            .generate_with_dynamic_template(&store, "french", "Hello")
            .await
            .unwrap();

        assert_eq!(reply, "Bonjour");
        let body = sent_body(&transport, 0);
        assert_eq!(body["system"], "Translate to French:");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "Hello"}]));
    }

    #[tokio::test]
    async fn test_static_template_is_concatenated() {
        let transport = Arc::new(ScriptedTransport::responses([text_reply("done")]));
        let client = client_with(ProviderConfiguration::anthropic("claude-3-haiku"), transport.clone());

        client.generate_with_template("Explain:", "monads").await.unwrap();
        let body = sent_body(&transport, 0);
        assert_eq!(body["messages"][0]["content"], "Explain:\nmonads");
        assert_eq!(body["system"], DEFAULT_ANTHROPIC_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_chat_keeps_system_out_of_history() {
        let transport = Arc::new(ScriptedTransport::responses([text_reply("r1"), text_reply("r2")]));
        let client = client_with(ProviderConfiguration::anthropic("claude-3-5-haiku"), transport.clone());

        client.chat("s", "q1", Some("You are a pirate.")).await.unwrap();
        client.chat("s", "q2", None).await.unwrap();

        let history = client.sessions().get("s").await;
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);

        let first = sent_body(&transport, 0);
        assert_eq!(first["system"], "You are a pirate.");
        let second = sent_body(&transport, 1);
        assert_eq!(second["system"], DEFAULT_ANTHROPIC_SYSTEM_PROMPT);
        assert_eq!(second["messages"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_chat_history_is_capped() {
        let transport = Arc::new(ScriptedTransport::responses([
            text_reply("a1"),
            text_reply("a2"),
            text_reply("a3"),
        ]));
        let client = client_with(
            ProviderConfiguration {
                max_chat_history_size: 3,
                ..ProviderConfiguration::anthropic("claude-3-opus")
            },
            transport.clone(),
        );

        for q in ["q1", "q2", "q3"] {
            client.chat("s", q, None).await.unwrap();
        }
        let contents: Vec<String> = client
            .sessions()
            .get("s")
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        // a2 would lead after eviction, so it goes too
        assert_eq!(contents, vec!["q3", "a3"]);
    }

    #[tokio::test]
    async fn test_even_cap_always_sends_user_turn_first() {
        let transport = Arc::new(ScriptedTransport::responses(
            (1..=5).map(|i| text_reply(&format!("a{i}"))),
        ));
        let client = client_with(
            ProviderConfiguration {
                max_chat_history_size: 4,
                ..ProviderConfiguration::anthropic("claude-3-haiku")
            },
            transport.clone(),
        );

        for i in 1..=5 {
            client.chat("s", &format!("q{i}"), None).await.unwrap();
        }

        for i in 0..5 {
            let body = sent_body(&transport, i);
            let messages = body["messages"].as_array().unwrap();
            assert!(messages.len() <= 4);
            assert_eq!(messages[0]["role"], "user", "request {i}");
            assert_eq!(messages.last().unwrap()["content"], format!("q{}", i + 1));
        }

        let history = client.sessions().get("s").await;
        assert!(history.len() <= 4);
        assert_eq!(history[0].role, Role::User);
    }

    #[test]
    fn test_open_with_user_turn() {
        let mut history = vec![
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
            ChatMessage::assistant("a2"),
        ];
        open_with_user_turn(&mut history);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "q2");

        let mut only_assistant = vec![ChatMessage::assistant("a1")];
        open_with_user_turn(&mut only_assistant);
        assert!(only_assistant.is_empty());
    }

    #[tokio::test]
    async fn test_blank_stored_template_fails_before_dispatch() {
        let transport = Arc::new(ScriptedTransport::responses([text_reply("unused")]));
        let client = client_with(ProviderConfiguration::anthropic("claude-3-haiku"), transport.clone());

        let mut store = DynamicPromptStore::new();
        store.add("blank", "");
        let err = client
            .generate_with_dynamic_template(&store, "blank", "Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidArgument(msg) if msg.contains("template")));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_chat_leaves_history_unchanged() {
        let transport = Arc::new(ScriptedTransport::responses([
            (200, r#"{"content":[{"type":"text","text":"hi"}]}"#),
            (200, r#"{"type":"error"}"#),
        ]));
        let client = client_with(ProviderConfiguration::anthropic("claude-3-haiku"), transport.clone());

        client.chat("s", "first", None).await.unwrap();
        let err = client.chat("s", "second", None).await.unwrap_err();

        assert!(matches!(err, AiError::MalformedResponse(_)));
        assert_eq!(client.sessions().get("s").await.len(), 2);
    }

    #[tokio::test]
    async fn test_wire_format_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(header_exists("content-type"))
            .and(body_partial_json(json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 150,
                "stop_sequences": ["STOP"],
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"content":[{"type":"text","text":"Hello, "},{"type":"text","text":"world."}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfiguration {
            api_base: Some(format!("{}/v1", server.uri())),
            stop_sequences: vec!["STOP".into()],
            ..ProviderConfiguration::anthropic("Claude3Haiku")
        };
        let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
        let client = client_with(config, transport);

        assert_eq!(client.generate("hi").await.unwrap(), "Hello, world.");
    }

    #[tokio::test]
    async fn test_unauthorized_is_terminal() {
        let transport = Arc::new(ScriptedTransport::responses([
            (401, r#"{"type":"error","error":{"type":"authentication_error"}}"#),
            (200, r#"{"content":[]}"#),
        ]));
        let client = client_with(ProviderConfiguration::anthropic("claude-3-haiku"), transport.clone());

        let err = client.generate("hi").await.unwrap_err();
        match err {
            AiError::TerminalHttp { provider, status, body } => {
                assert_eq!(provider, Provider::Anthropic);
                assert_eq!(status, 401);
                assert!(body.contains("authentication_error"));
            }
            other => panic!("expected TerminalHttp, got {other:?}"),
        }
        assert_eq!(transport.calls(), 1);
    }
}
