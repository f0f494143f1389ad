//! Configuration loading and defaults.
//!
//! Configuration is an explicit value threaded through session construction;
//! there is no process-global state. Values come from an optional TOML file
//! (`~/.termpilot/config.toml`) with CLI flags layered on top by the caller.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default chat-completion endpoint (OpenRouter).
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default decision model.
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Decision-service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key for the chat-completion endpoint.
    pub api_key: String,
    /// Base URL of the endpoint (OpenAI-compatible).
    pub base_url: String,
    /// Model identifier, e.g. "anthropic/claude-3.5-sonnet".
    pub model: String,
    /// Preferred provider routing order (OpenRouter extension).
    pub provider_order: Vec<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider_order: vec!["Anthropic".to_string()],
        }
    }
}

/// Timing knobs for the session control loop.
///
/// Production defaults match the pacing the assistant CLIs need; tests
/// shrink these to near zero.
#[derive(Debug, Clone)]
pub struct RunTiming {
    /// Delay after terminal startup before the first poll, allowing the
    /// automation layer's window/process spin-up.
    pub settle: Duration,
    /// Interval between screen polls.
    pub poll_interval: Duration,
    /// Minimum time the screen must stay unchanged before a directive query.
    pub stability_threshold: Duration,
    /// Delay after a `wait` directive before polling again.
    pub wait_delay: Duration,
    /// Delay after a prompt or custom tool dispatch before polling again.
    pub dispatch_delay: Duration,
}

impl Default for RunTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            stability_threshold: Duration::from_millis(800),
            wait_delay: Duration::from_secs(2),
            dispatch_delay: Duration::from_millis(1500),
        }
    }
}

impl RunTiming {
    /// Zeroed timing for tests: the loop runs as fast as the scripted
    /// collaborators allow.
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            poll_interval: Duration::ZERO,
            stability_threshold: Duration::ZERO,
            wait_delay: Duration::ZERO,
            dispatch_delay: Duration::ZERO,
        }
    }
}

/// On-disk configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
}

impl Config {
    /// Default config file location: `~/.termpilot/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".termpilot")
            .join("config.toml")
    }

    /// Load configuration from the given path, or the default location.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.provider_order, vec!["Anthropic".to_string()]);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/termpilot.toml"))).unwrap();
        assert_eq!(config.llm.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nmodel = \"qwen/qwen3-32b\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "qwen/qwen3-32b");
        // Unspecified fields keep their defaults
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not toml {{{{").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
