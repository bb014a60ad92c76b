//! Configuration types for the assistant.

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Remote LLM endpoint settings.
    pub llm: LlmConfig,
    /// Speech capture/playback settings.
    pub speech: SpeechConfig,
    /// Session behaviour settings.
    pub session: SessionConfig,
}

/// Remote LLM endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Endpoint base URL (everything before `/v1beta/...`).
    pub api_url: String,
    /// Model identifier appended to the generate path.
    pub api_model: String,
    /// Inline API key. Prefer `api_key_env`.
    pub api_key: String,
    /// Environment variable to resolve the API key from; takes precedence
    /// over `api_key` when set and non-empty in the environment.
    pub api_key_env: Option<String>,
    /// Maximum output length in tokens.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling probability mass.
    pub top_p: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Total attempts per logical call (first try + retries).
    pub max_attempts: u32,
    /// Hard timeout per attempt, in seconds.
    pub request_timeout_secs: u64,
    /// Backoff base for HTTP-level retries (429/5xx), in milliseconds.
    pub http_backoff_base_ms: u64,
    /// Backoff ceiling for HTTP-level retries, in milliseconds.
    pub http_backoff_cap_ms: u64,
    /// Backoff base for network/timeout retries, in milliseconds.
    pub network_backoff_base_ms: u64,
    /// Backoff ceiling for network/timeout retries, in milliseconds.
    pub network_backoff_cap_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com".to_owned(),
            api_model: "gemini-2.5-flash".to_owned(),
            api_key: String::new(),
            api_key_env: Some("ORBIT_LLM_API_KEY".to_owned()),
            max_output_tokens: 16_384,
            temperature: 0.7,
            top_p: 1.0,
            top_k: 40,
            max_attempts: 5,
            request_timeout_secs: 90,
            http_backoff_base_ms: 2_000,
            http_backoff_cap_ms: 15_000,
            network_backoff_base_ms: 3_000,
            network_backoff_cap_ms: 20_000,
        }
    }
}

impl LlmConfig {
    /// Resolve the credential: environment variable first, then the inline
    /// value. Returns an error when neither yields a non-empty key.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(var) = self.api_key_env.as_deref() {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    return Ok(value);
                }
            }
        }
        if !self.api_key.trim().is_empty() {
            return Ok(self.api_key.clone());
        }
        Err(AssistantError::Config(
            "LLM API key not configured (set api_key or the api_key_env variable)".to_owned(),
        ))
    }
}

/// Speech playback preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Playback rate multiplier.
    pub rate: f32,
    /// Playback pitch multiplier.
    pub pitch: f32,
    /// Playback volume, 0.0..=1.0.
    pub volume: f32,
    /// Preferred voice language tag prefix.
    pub preferred_lang: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
            preferred_lang: "en".to_owned(),
        }
    }
}

/// Session behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before restarting capture after a stop command, in milliseconds.
    pub stop_restart_delay_ms: u64,
    /// Delay before restarting capture after an unexpected end, in milliseconds.
    pub capture_restart_delay_ms: u64,
    /// Whether to speak and log a greeting when the session starts.
    pub greet_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stop_restart_delay_ms: 300,
            capture_restart_delay_ms: 200,
            greet_on_start: true,
        }
    }
}

impl AssistantConfig {
    /// Default config file path under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("orbit").join("config.toml"))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AssistantError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&raw)
            .map_err(|e| AssistantError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Load from the default path, falling back to defaults when the file
    /// does not exist.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}
