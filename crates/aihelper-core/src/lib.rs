//! Core building blocks for AIHelper.
//!
//! # Modules
//!
//! - [`types`] — providers, chat roles, chat messages
//! - [`error`] — the [`AiError`] taxonomy shared by every crate
//! - [`config`] — `ProviderConfiguration` schema, JSON loader, env overrides
//! - [`session`] — bounded chat histories with per-key locking
//! - [`prompts`] — predefined and dynamic prompt templates
//! - [`utils`] — input validation and small string helpers

pub mod config;
pub mod error;
pub mod prompts;
pub mod session;
pub mod types;
pub mod utils;

pub use config::{ProviderConfiguration, ProxyConfig};
pub use error::{AiError, Result};
pub use prompts::{DynamicPromptStore, PredefinedPrompt, PredefinedPrompts, TemplateProvider};
pub use session::ChatSessionStore;
pub use types::{ChatHistory, ChatMessage, Provider, Role};
