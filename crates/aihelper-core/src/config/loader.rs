//! Config loader — reads `~/.aihelper/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `ProviderConfiguration::default()`)
//! 2. JSON file at `~/.aihelper/config.json`
//! 3. Environment variables `AIHELPER_<FIELD>` (override JSON)

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::schema::{ProviderConfiguration, ProxyConfig};
use crate::types::Provider;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `ProviderConfiguration::default()` if the file doesn't exist
/// or can't be parsed.
pub fn load_config(path: Option<&Path>) -> ProviderConfiguration {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> ProviderConfiguration {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return ProviderConfiguration::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return ProviderConfiguration::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            ProviderConfiguration::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &ProviderConfiguration, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Supported overrides:
/// - `AIHELPER_PROVIDER` → `provider`
/// - `AIHELPER_MODEL` → `model`
/// - `AIHELPER_MAX_TOKENS` → `max_tokens`
/// - `AIHELPER_TEMPERATURE` → `temperature`
/// - `AIHELPER_TOP_P` → `top_p`
/// - `AIHELPER_MAX_RETRY_COUNT` → `max_retry_count`
/// - `AIHELPER_RETRY_DELAY_MS` → `retry_delay_ms`
/// - `AIHELPER_REQUEST_TIMEOUT_MS` → `request_timeout_ms`
/// - `AIHELPER_API_BASE` → `api_base`
/// - `AIHELPER_PROXY_HOST` + `AIHELPER_PROXY_PORT` → `proxy`
pub fn apply_env_overrides(config: ProviderConfiguration) -> ProviderConfiguration {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides<F>(mut config: ProviderConfiguration, lookup: F) -> ProviderConfiguration
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("AIHELPER_PROVIDER") {
        match Provider::parse(&val) {
            Some(provider) => config.provider = provider,
            None => warn!("Ignoring unknown AIHELPER_PROVIDER value: {}", val),
        }
    }
    if let Some(val) = lookup("AIHELPER_MODEL") {
        config.model = val;
    }
    if let Some(n) = lookup("AIHELPER_MAX_TOKENS").and_then(|v| v.parse().ok()) {
        config.max_tokens = n;
    }
    if let Some(t) = lookup("AIHELPER_TEMPERATURE").and_then(|v| v.parse().ok()) {
        config.temperature = t;
    }
    if let Some(p) = lookup("AIHELPER_TOP_P").and_then(|v| v.parse().ok()) {
        config.top_p = p;
    }
    if let Some(n) = lookup("AIHELPER_MAX_RETRY_COUNT").and_then(|v| v.parse().ok()) {
        config.max_retry_count = n;
    }
    if let Some(ms) = lookup("AIHELPER_RETRY_DELAY_MS").and_then(|v| v.parse().ok()) {
        config.retry_delay_ms = ms;
    }
    if let Some(ms) = lookup("AIHELPER_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        config.request_timeout_ms = ms;
    }
    if let Some(val) = lookup("AIHELPER_API_BASE") {
        config.api_base = Some(val);
    }
    if let Some(host) = lookup("AIHELPER_PROXY_HOST") {
        let port = lookup("AIHELPER_PROXY_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        config.proxy = Some(ProxyConfig::new(host, port));
    }

    config
}

/// Resolve the API key for a provider from the environment.
///
/// Checks `AIHELPER_<PROVIDER>_API_KEY` first, then the provider's
/// conventional variable (e.g. `OPENAI_API_KEY`).
pub fn resolve_api_key(provider: Provider) -> Option<String> {
    resolve_api_key_with(provider, |key| std::env::var(key).ok())
}

fn resolve_api_key_with<F>(provider: Provider, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let scoped = format!("AIHELPER_{}_API_KEY", provider.as_str().to_uppercase());
    let conventional = format!("{}_API_KEY", provider.as_str().to_uppercase());

    [scoped, conventional]
        .iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
