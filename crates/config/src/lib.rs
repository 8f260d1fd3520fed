//! Configuration loading and validation for yaa.
//!
//! Loads configuration from `~/.yaa/config.toml` (optional) with
//! environment variable overrides, then validates it at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Placeholder in the system prompt replaced with the startup time.
pub const DATE_PLACEHOLDER: &str = "%YAA_DATE%";

/// The root configuration structure.
///
/// Maps directly to `~/.yaa/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model identifier passed to the inference service
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional system prompt; `%YAA_DATE%` is expanded at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,

    /// How long the model stays loaded between requests
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Hide the model's reasoning segment until the end marker shows up
    #[serde(default = "default_true")]
    pub hide_reasoning: bool,

    /// How many times to ask the model to identify itself at startup
    #[serde(default = "default_identity_attempts")]
    pub identity_attempts: u32,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,
}

fn default_model() -> String {
    "qwen3:14b".into()
}
fn default_ollama_host() -> String {
    "http://127.0.0.1:11434".into()
}
fn default_keep_alive_secs() -> u64 {
    600
}
fn default_identity_attempts() -> u32 {
    3
}
fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from the default path (~/.yaa/config.toml).
    ///
    /// Environment variables override the file:
    /// - `OLLAMA_MODEL`
    /// - `OLLAMA_SYSTEM` (empty means no system prompt)
    /// - `OLLAMA_HOST`
    /// - `YAA_DEBUG` (`"true"` enables debug logging)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let config = Self::load_from(&config_path)?;
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Load configuration from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides (highest priority) and re-validate.
    ///
    /// `lookup` abstracts the environment so overrides can be tested.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|m| !m.is_empty()) {
            self.model = model;
        }

        if let Some(system) = lookup("OLLAMA_SYSTEM") {
            self.system_prompt = Some(system).filter(|s| !s.is_empty());
        }

        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.is_empty()) {
            self.ollama_host = host;
        }

        if lookup("YAA_DEBUG").as_deref() == Some("true") {
            self.debug = true;
        }

        self.ollama_host = normalize_host(&self.ollama_host);
        self.validate()?;
        Ok(self)
    }

    /// The system prompt with `%YAA_DATE%` replaced by `now` in RFC 3339.
    pub fn system_prompt_at<Tz>(&self, now: &DateTime<Tz>) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.system_prompt
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|s| s.replace(DATE_PLACEHOLDER, &now.to_rfc3339()))
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".yaa")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.keep_alive_secs == 0 {
            return Err(ConfigError::ValidationError(
                "keep_alive_secs must be greater than 0".into(),
            ));
        }

        if self.ollama_host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama_host must not be empty".into(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_prompt: None,
            ollama_host: default_ollama_host(),
            keep_alive_secs: default_keep_alive_secs(),
            hide_reasoning: true,
            identity_attempts: default_identity_attempts(),
            debug: false,
        }
    }
}

/// `OLLAMA_HOST` is commonly set without a scheme (`0.0.0.0:11434`).
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
