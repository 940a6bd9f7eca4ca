//! Response parser — extracts generated text from raw provider bodies.

use serde::Deserialize;

use aihelper_core::{AiError, Provider, Result};

/// Which provider's response layout to expect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseShape {
    OpenAi,
    Anthropic,
}

impl ResponseShape {
    pub fn for_provider(provider: Provider) -> Result<Self> {
        match provider {
            Provider::OpenAi => Ok(ResponseShape::OpenAi),
            Provider::Anthropic => Ok(ResponseShape::Anthropic),
            other => Err(AiError::UnsupportedProvider(other)),
        }
    }
}

// ── OpenAI ──

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

// ── Anthropic ──

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Option<Vec<ContentBlock>>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// Extract the generated text from `raw`.
pub fn parse(raw: &str, shape: ResponseShape) -> Result<String> {
    match shape {
        ResponseShape::OpenAi => parse_openai(raw),
        ResponseShape::Anthropic => parse_anthropic(raw),
    }
}

fn parse_openai(raw: &str) -> Result<String> {
    let response: OpenAiResponse = serde_json::from_str(raw)
        .map_err(|e| AiError::MalformedResponse(format!("invalid OpenAI JSON: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::MalformedResponse("OpenAI response has no choices".into()))?;

    // chat shape first, then the legacy completions shape
    choice
        .message
        .and_then(|m| m.content)
        .or(choice.text)
        .ok_or_else(|| {
            AiError::MalformedResponse("OpenAI choice has neither message.content nor text".into())
        })
}

fn parse_anthropic(raw: &str) -> Result<String> {
    let response: AnthropicResponse = serde_json::from_str(raw)
        .map_err(|e| AiError::MalformedResponse(format!("invalid Anthropic JSON: {e}")))?;

    let blocks = response
        .content
        .ok_or_else(|| AiError::MalformedResponse("Anthropic response has no content".into()))?;

    let mut text = String::new();
    for block in blocks.into_iter().filter(|b| b.kind == "text") {
        let part = block
            .text
            .ok_or_else(|| AiError::MalformedResponse("text block without text".into()))?;
        text.push_str(&part);
    }
    Ok(text)
}
