//! Model and provider registry — static catalogs plus lookup logic.
//!
//! Each [`ModelSpec`] maps one or more selector aliases onto the wire-level
//! model identifier and its owning provider. Dated snapshots frequently share
//! a wire identifier with their base model; that is expected.
//! Each [`ProviderSpec`] describes how to reach a provider.

use aihelper_core::config::schema::default_model as default_selector;
use aihelper_core::{AiError, Provider, Result};

// ─────────────────────────────────────────────
// ModelSpec — one catalog entry
// ─────────────────────────────────────────────

/// A catalog entry: selector aliases → wire identifier + provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    /// Names a caller may use to select this model. Matching ignores case
    /// and treats `_` and `-` alike.
    pub aliases: &'static [&'static str],
    /// Exact string the provider expects in the `model` field.
    pub wire_id: &'static str,
    /// Provider that serves this model.
    pub provider: Provider,
}

impl ModelSpec {
    /// Whether `selector` names this entry (wire id or any alias).
    fn matches(&self, normalized: &str) -> bool {
        self.wire_id == normalized || self.aliases.iter().any(|a| normalize(a) == normalized)
    }
}

const fn openai(aliases: &'static [&'static str], wire_id: &'static str) -> ModelSpec {
    ModelSpec {
        aliases,
        wire_id,
        provider: Provider::OpenAi,
    }
}

const fn anthropic(aliases: &'static [&'static str], wire_id: &'static str) -> ModelSpec {
    ModelSpec {
        aliases,
        wire_id,
        provider: Provider::Anthropic,
    }
}

/// Complete model catalog.
pub static MODELS: &[ModelSpec] = &[
    // ── OpenAI: GPT-3.5 / GPT-4 ──
    openai(&["GPT_3_5_Turbo"], "gpt-3.5-turbo"),
    openai(&["GPT_3_5_Turbo_16k"], "gpt-3.5-turbo-16k"),
    openai(&["GPT_3_5_Turbo_0125"], "gpt-3.5-turbo-0125"),
    openai(&["GPT_3_5_Turbo_Instruct"], "gpt-3.5-turbo-instruct"),
    openai(&["GPT_3_5_Turbo_Instruct_0914"], "gpt-3.5-turbo-instruct-0914"),
    openai(&["GPT_3_5_Turbo_1106"], "gpt-3.5-turbo-1106"),
    openai(&["GPT_4"], "gpt-4"),
    openai(&["GPT_4_Turbo"], "gpt-4-turbo"),
    openai(&["GPT_4_Turbo_2024_04_09"], "gpt-4-turbo-2024-04-09"),
    openai(&["GPT_4_Turbo_Preview"], "gpt-4-turbo-preview"),
    openai(&["GPT_4_0613"], "gpt-4-0613"),
    openai(&["GPT_4_0125_Preview"], "gpt-4-0125-preview"),
    openai(&["GPT_4_1106_Preview"], "gpt-4-1106-preview"),
    // ── OpenAI: GPT-4.1 ──
    openai(&["GPT_4_1"], "gpt-4.1"),
    openai(&["GPT_4_1_2025_04_14"], "gpt-4.1-2025-04-14"),
    openai(&["GPT_4_1_Mini"], "gpt-4.1-mini"),
    openai(&["GPT_4_1_Mini_2025_04_14"], "gpt-4.1-mini-2025-04-14"),
    openai(&["GPT_4_1_Nano"], "gpt-4.1-nano"),
    openai(&["GPT_4_1_Nano_2025_04_14"], "gpt-4.1-nano-2025-04-14"),
    // ── OpenAI: GPT-4o ──
    openai(&["GPT_4o"], "gpt-4o"),
    openai(&["GPT_4o_2024_05_13"], "gpt-4o-2024-05-13"),
    openai(&["GPT_4o_2024_08_06"], "gpt-4o-2024-08-06"),
    openai(&["GPT_4o_2024_11_20"], "gpt-4o-2024-11-20"),
    openai(&["ChatGPT_4o_Latest"], "chatgpt-4o-latest"),
    openai(&["GPT_4o_Mini"], "gpt-4o-mini"),
    openai(&["GPT_4o_Mini_2024_07_18"], "gpt-4o-mini-2024-07-18"),
    openai(&["GPT_4o_Nano"], "gpt-4o-nano"),
    openai(&["GPT_4o_Nano_2025_04_14"], "gpt-4o-nano-2025-04-14"),
    // ── OpenAI: specialized GPT-4o ──
    openai(&["GPT_4o_RealTime_Preview"], "gpt-4o-realtime-preview"),
    openai(&["GPT_4o_RealTime_Preview_2024_10_01"], "gpt-4o-realtime-preview-2024-10-01"),
    openai(&["GPT_4o_RealTime_Preview_2024_12_17"], "gpt-4o-realtime-preview-2024-12-17"),
    openai(&["GPT_4o_Mini_RealTime_Preview"], "gpt-4o-mini-realtime-preview"),
    openai(
        &["GPT_4o_Mini_RealTime_Preview_2024_12_17"],
        "gpt-4o-mini-realtime-preview-2024-12-17",
    ),
    openai(&["GPT_4o_Audio_Preview"], "gpt-4o-audio-preview"),
    openai(&["GPT_4o_Audio_Preview_2024_12_17"], "gpt-4o-audio-preview-2024-12-17"),
    openai(&["GPT_4o_Transcribe_2025_03_20"], "gpt-4o-transcribe-2025-03-20"),
    openai(&["GPT_4o_Mini_TTS_2025_03_20"], "gpt-4o-mini-tts-2025-03-20"),
    openai(&["GPT_4o_Mini_Transcribe_2025_03_20"], "gpt-4o-mini-transcribe-2025-03-20"),
    openai(&["GPT_4o_Mini_Audio_Preview"], "gpt-4o-mini-audio-preview"),
    openai(&["GPT_4o_Mini_Audio_Preview_2024_12_17"], "gpt-4o-mini-audio-preview-2024-12-17"),
    // ── OpenAI: o-series reasoning (snapshots share the base id) ──
    openai(&["O1", "O1_2024_12_17"], "o1"),
    openai(&["O1_Preview", "O1_Preview_2024_09_12"], "o1-preview"),
    openai(&["O1_Mini", "O1_Mini_2024_09_12"], "o1-mini"),
    openai(&["O3_Mini", "O3_Mini_2025_01_31"], "o3-mini"),
    openai(&["O4_Mini", "O4_Mini_2025_04_16"], "o4-mini"),
    // ── OpenAI: previews ──
    openai(&["GPT_4_5_Preview"], "gpt-4.5-preview"),
    openai(&["GPT_4_5_Preview_2025_02_27"], "gpt-4.5-preview-2025-02-27"),
    // ── OpenAI: legacy completion models (no chat) ──
    openai(&["Davinci_002"], "davinci-002"),
    openai(&["Babbage_002"], "babbage-002"),
    // ── Anthropic: Claude 3.7 / 3.5 ──
    anthropic(&["Claude3_7_Sonnet", "claude-3-7-sonnet"], "claude-3-7-sonnet-20250219"),
    anthropic(&["Claude3_5_Sonnet", "claude-3-5-sonnet"], "claude-3-5-sonnet-20240620"),
    anthropic(&["Claude3_5_Haiku", "claude-3-5-haiku"], "claude-3-5-haiku-20241022"),
    // ── Anthropic: Claude 3 ──
    anthropic(&["Claude3Opus", "claude-3-opus"], "claude-3-opus-20240229"),
    anthropic(&["Claude3Sonnet", "claude-3-sonnet"], "claude-3-sonnet-20240229"),
    anthropic(&["Claude3Haiku", "claude-3-haiku"], "claude-3-haiku-20240307"),
    // ── Anthropic: legacy ──
    anthropic(&["Claude2_1"], "claude-2.1"),
    anthropic(&["Claude2"], "claude-2"),
    anthropic(&["ClaudeInstant1_2"], "claude-instant-1.2"),
    anthropic(&["ClaudeInstant1"], "claude-instant-1"),
];

fn normalize(selector: &str) -> String {
    selector.trim().to_lowercase().replace('_', "-")
}

/// Resolve a model selector to its catalog entry.
pub fn resolve_model(selector: &str) -> Result<&'static ModelSpec> {
    let normalized = normalize(selector);
    MODELS
        .iter()
        .find(|spec| spec.matches(&normalized))
        .ok_or_else(|| AiError::UnknownModel(selector.trim().to_string()))
}

/// All catalog entries served by `provider`, in catalog order.
pub fn models_for(provider: Provider) -> impl Iterator<Item = &'static ModelSpec> {
    MODELS.iter().filter(move |spec| spec.provider == provider)
}

/// Catalog entry used when a configuration leaves the model blank.
pub fn default_model(provider: Provider) -> Result<&'static ModelSpec> {
    resolve_model(default_selector(provider))
}

// ─────────────────────────────────────────────
// ProviderSpec — how to reach one provider
// ─────────────────────────────────────────────

/// How a provider expects the API key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer {key}`
    Bearer,
    /// `x-api-key: {key}` plus an `anthropic-version` header
    AnthropicKey,
}

/// How to reach one implemented provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub provider: Provider,
    /// Human-readable name for logs. E.g. `"OpenAI"`.
    pub display_name: &'static str,
    /// Environment variable conventionally holding the API key.
    pub env_key: &'static str,
    /// Default API base URL.
    pub default_api_base: &'static str,
    pub auth: AuthStyle,
}

impl ProviderSpec {
    /// Tells the user which variables `resolve_api_key` reads for this provider.
    pub fn api_key_hint(&self) -> String {
        format!(
            "set AIHELPER_{}_API_KEY or {}",
            self.provider.as_str().to_uppercase(),
            self.env_key
        )
    }
}

/// Providers that have a client implementation.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        provider: Provider::OpenAi,
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        default_api_base: "https://api.openai.com/v1",
        auth: AuthStyle::Bearer,
    },
    ProviderSpec {
        provider: Provider::Anthropic,
        display_name: "Anthropic",
        env_key: "ANTHROPIC_API_KEY",
        default_api_base: "https://api.anthropic.com/v1",
        auth: AuthStyle::AnthropicKey,
    },
];

/// Find the spec for a provider; `None` means no client implementation exists.
pub fn find_spec(provider: Provider) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.provider == provider)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_wire_id() {
        let spec = resolve_model("gpt-4o-mini").unwrap();
        assert_eq!(spec.wire_id, "gpt-4o-mini");
        assert_eq!(spec.provider, Provider::OpenAi);
    }

    #[test]
    fn test_resolve_by_enum_style_alias() {
        assert_eq!(resolve_model("GPT_4o_Mini").unwrap().wire_id, "gpt-4o-mini");
        assert_eq!(resolve_model("ChatGPT_4o_Latest").unwrap().wire_id, "chatgpt-4o-latest");
        assert_eq!(
            resolve_model("Claude3_5_Haiku").unwrap().wire_id,
            "claude-3-5-haiku-20241022"
        );
    }

    #[test]
    fn test_snapshot_aliases_share_wire_id() {
        assert_eq!(resolve_model("o1-2024-12-17").unwrap().wire_id, "o1");
        assert_eq!(resolve_model("O3_Mini_2025_01_31").unwrap().wire_id, "o3-mini");
        assert_eq!(resolve_model("o4-mini").unwrap().wire_id, "o4-mini");
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_trims() {
        assert_eq!(resolve_model("  CLAUDE-3-OPUS ").unwrap().wire_id, "claude-3-opus-20240229");
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolve_model("llama-3-70b").unwrap_err();
        assert!(matches!(err, AiError::UnknownModel(m) if m == "llama-3-70b"));
    }

    #[test]
    fn test_models_for_provider() {
        assert!(models_for(Provider::OpenAi).all(|m| m.provider == Provider::OpenAi));
        assert_eq!(models_for(Provider::Anthropic).count(), 10);
        assert_eq!(models_for(Provider::Cohere).count(), 0);
    }

    #[test]
    fn test_default_models_resolve() {
        assert_eq!(default_model(Provider::OpenAi).unwrap().wire_id, "gpt-3.5-turbo");
        assert_eq!(
            default_model(Provider::Anthropic).unwrap().wire_id,
            "claude-3-sonnet-20240229"
        );
    }

    #[test]
    fn test_aliases_are_unambiguous() {
        for spec in MODELS {
            for alias in spec.aliases {
                let resolved = resolve_model(alias).unwrap();
                assert_eq!(resolved.wire_id, spec.wire_id, "alias {alias} is shadowed");
            }
        }
    }

    #[test]
    fn test_find_spec() {
        assert_eq!(find_spec(Provider::OpenAi).unwrap().auth, AuthStyle::Bearer);
        assert_eq!(
            find_spec(Provider::Anthropic).unwrap().default_api_base,
            "https://api.anthropic.com/v1"
        );
        assert!(find_spec(Provider::Cohere).is_none());
    }

    #[test]
    fn test_api_key_hint_names_both_variables() {
        assert_eq!(
            find_spec(Provider::OpenAi).unwrap().api_key_hint(),
            "set AIHELPER_OPENAI_API_KEY or OPENAI_API_KEY"
        );
        assert_eq!(
            find_spec(Provider::Anthropic).unwrap().api_key_hint(),
            "set AIHELPER_ANTHROPIC_API_KEY or ANTHROPIC_API_KEY"
        );
        // env_key is the conventional name the config loader falls back to
        for spec in PROVIDERS {
            assert_eq!(
                spec.env_key,
                format!("{}_API_KEY", spec.provider.as_str().to_uppercase())
            );
        }
    }
}
