//! Utility helpers — path resolution, input validation, string truncation.

use std::path::PathBuf;

use crate::error::{AiError, Result};

/// Get the AIHelper data directory (e.g. `~/.aihelper/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".aihelper")
}

/// Fail with [`AiError::InvalidArgument`] if `value` is empty or whitespace.
pub fn ensure_not_blank(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AiError::InvalidArgument(format!("{name} cannot be null or empty")))
    } else {
        Ok(())
    }
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
