//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use aihelper_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Model: {}", cfg.model_selector());
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{apply_env_overrides, get_config_path, load_config, resolve_api_key, save_config};
pub use schema::{ProviderConfiguration, ProxyConfig};
