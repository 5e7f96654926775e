use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::editor::EditorSettings;
use crate::llm_client::DEFAULT_MODEL;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means the process-local store.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub translation_model: String,
    pub port: u16,
    pub rust_log: String,
    pub autosave_interval_secs: u64,
    pub history_max_depth: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            translation_model: std::env::var("TRANSLATION_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            autosave_interval_secs: positive(
                "AUTOSAVE_INTERVAL_SECS",
                std::env::var("AUTOSAVE_INTERVAL_SECS").ok(),
                5,
            )?,
            history_max_depth: positive(
                "HISTORY_MAX_DEPTH",
                std::env::var("HISTORY_MAX_DEPTH").ok(),
                100,
            )? as usize,
        })
    }

    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            autosave_interval: Duration::from_secs(self.autosave_interval_secs),
            history_max_depth: self.history_max_depth,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses an optional integer setting that must be at least 1.
fn positive(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))?;
    if value == 0 {
        bail!("{key} must be at least 1");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_uses_default_when_unset() {
        assert_eq!(positive("X", None, 5).unwrap(), 5);
        assert_eq!(positive("X", Some(" 12 ".into()), 5).unwrap(), 12);
    }

    #[test]
    fn test_positive_rejects_zero_and_garbage() {
        assert!(positive("X", Some("0".into()), 5).is_err());
        let err = positive("AUTOSAVE_INTERVAL_SECS", Some("soon".into()), 5).unwrap_err();
        assert!(err.to_string().contains("AUTOSAVE_INTERVAL_SECS"));
    }
}
