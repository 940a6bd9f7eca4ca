//! Prompt templates — fixed predefined prompts and a runtime template store.

use std::collections::HashMap;

use crate::error::{AiError, Result};

/// Source of prompt templates looked up by key.
pub trait TemplateProvider: Send + Sync {
    /// Fetch the template for `key`, or fail with [`AiError::TemplateNotFound`].
    fn get(&self, key: &str) -> Result<String>;
}

// ─────────────────────────────────────────────
// Predefined prompts
// ─────────────────────────────────────────────

/// Built-in prompt templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredefinedPrompt {
    Summarize,
    Explain,
    BlogPost,
    CodeReview,
}

impl PredefinedPrompt {
    pub const ALL: [PredefinedPrompt; 4] = [
        PredefinedPrompt::Summarize,
        PredefinedPrompt::Explain,
        PredefinedPrompt::BlogPost,
        PredefinedPrompt::CodeReview,
    ];

    /// Template text.
    pub fn text(&self) -> &'static str {
        match self {
            PredefinedPrompt::Summarize => "Summarize the following text:",
            PredefinedPrompt::Explain => "Explain this concept in simple terms:",
            PredefinedPrompt::BlogPost => "Write a blog post about the following topic:",
            PredefinedPrompt::CodeReview => "Review the following code and suggest improvements:",
        }
    }

    /// Kebab-case key (e.g. `"code-review"`).
    pub fn key(&self) -> &'static str {
        match self {
            PredefinedPrompt::Summarize => "summarize",
            PredefinedPrompt::Explain => "explain",
            PredefinedPrompt::BlogPost => "blog-post",
            PredefinedPrompt::CodeReview => "code-review",
        }
    }

    /// Look up by key; `_` and `-` are interchangeable, case is ignored.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key.trim().to_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|p| p.key() == normalized)
    }
}

/// [`TemplateProvider`] over the built-in prompts.
#[derive(Clone, Copy, Debug, Default)]
pub struct PredefinedPrompts;

impl TemplateProvider for PredefinedPrompts {
    fn get(&self, key: &str) -> Result<String> {
        PredefinedPrompt::from_key(key)
            .map(|p| p.text().to_string())
            .ok_or_else(|| AiError::TemplateNotFound(key.to_string()))
    }
}

// ─────────────────────────────────────────────
// Dynamic prompts
// ─────────────────────────────────────────────

/// Templates registered at runtime.
#[derive(Clone, Debug, Default)]
pub struct DynamicPromptStore {
    prompts: HashMap<String, String>,
}

impl DynamicPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a template.
    pub fn add(&mut self, key: impl Into<String>, prompt: impl Into<String>) {
        self.prompts.insert(key.into(), prompt.into());
    }

    /// Remove a template, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.prompts.remove(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.prompts.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl TemplateProvider for DynamicPromptStore {
    fn get(&self, key: &str) -> Result<String> {
        self.prompts
            .get(key)
            .cloned()
            .ok_or_else(|| AiError::TemplateNotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_lookup() {
        assert_eq!(
            PredefinedPrompt::from_key("Code_Review"),
            Some(PredefinedPrompt::CodeReview)
        );
        assert_eq!(
            PredefinedPrompts.get("summarize").unwrap(),
            "Summarize the following text:"
        );
        assert!(matches!(
            PredefinedPrompts.get("haiku"),
            Err(AiError::TemplateNotFound(key)) if key == "haiku"
        ));
    }

    #[test]
    fn test_predefined_keys_round_trip() {
        for prompt in PredefinedPrompt::ALL {
            assert_eq!(PredefinedPrompt::from_key(prompt.key()), Some(prompt));
        }
    }

    #[test]
    fn test_dynamic_store() {
        let mut store = DynamicPromptStore::new();
        assert!(store.is_empty());

        store.add("translate", "Translate to French:");
        store.add("greet", "Say hello to:");
        store.add("translate", "Translate to German:");

        assert_eq!(store.len(), 2);
        assert_eq!(store.keys(), vec!["greet", "translate"]);
        assert_eq!(store.get("translate").unwrap(), "Translate to German:");

        assert_eq!(store.remove("greet").as_deref(), Some("Say hello to:"));
        assert!(matches!(store.get("greet"), Err(AiError::TemplateNotFound(_))));
    }
}
