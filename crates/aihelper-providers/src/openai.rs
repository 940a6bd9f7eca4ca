//! OpenAI client — chat completions for chat-capable models, legacy
//! completions for the rest.
//!
//! Chat sessions store their system prompt as the first message of the
//! history, seeded on first use of a session key.

use std::sync::Arc;

use async_trait::async_trait;

use aihelper_core::utils::ensure_not_blank;
use aihelper_core::{
    ChatMessage, ChatSessionStore, Provider, ProviderConfiguration, Result, TemplateProvider,
};

use crate::client::{AiClient, ClientCore};
use crate::registry::ModelSpec;
use crate::request::{compose_template, ensure_chat_model, RequestInput};
use crate::transport::HttpTransport;

pub struct OpenAiClient {
    core: ClientCore,
}

impl OpenAiClient {
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
impl AiClient for OpenAiClient {
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
        let prompt = compose_template(&template, input);
        let payload = self.core.build(RequestInput::Prompt(&prompt))?;
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
        ensure_chat_model(self.core.model)?;

        let session = self.core.lock_session(session_key).await;

        let mut staged = Vec::with_capacity(2);
        if session.is_empty() {
            let system = initial_system_prompt
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| self.core.config.effective_system_instructions());
            staged.push(ChatMessage::system(system));
        }
        staged.push(ChatMessage::user(user_message));
        let mut history = session.staged(staged);

        let payload = self.core.build(RequestInput::Conversation {
            messages: &history,
            system: None,
        })?;
        let reply = self.core.send(&payload).await?;

        history.push(ChatMessage::assistant(reply.clone()));
        session.commit(history);
        Ok(reply)
    }

    fn provider(&self) -> Provider {
        Provider::OpenAi
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
