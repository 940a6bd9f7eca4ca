//! LLM provider layer for AIHelper.
//!
//! Direct HTTP clients for OpenAI and Anthropic behind one trait.
//!
//! # Architecture
//!
//! - [`registry`] — model catalog and per-provider specs
//! - [`request`] — builds provider-specific request bodies
//! - [`transport`] — the [`transport::HttpTransport`] seam and its `reqwest` implementation
//! - [`retry`] — outcome classification and the retry loop
//! - [`response`] — extracts generated text from raw bodies
//! - [`client::AiClient`] — trait that both clients implement
//! - [`factory`] — validates a configuration and builds the right client

pub mod anthropic;
pub mod client;
pub mod factory;
pub mod openai;
pub mod registry;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

// Re-export main types for convenience
pub use anthropic::AnthropicClient;
pub use client::{with_timeout, AiClient};
pub use factory::{create_client, create_client_from_env, ClientFactory};
pub use openai::OpenAiClient;
pub use registry::{models_for, resolve_model, ModelSpec, ProviderSpec, MODELS, PROVIDERS};
pub use transport::{HttpTransport, ReqwestTransport};
