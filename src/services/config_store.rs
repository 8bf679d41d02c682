// Configuration Storage Service
// Persisted config file lookup plus the resolved per-run configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "nvidia/llama-3.1-nemotron-nano-8b-v1:free";
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_BATCH_PAUSE_SECS: u64 = 2;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 80;

/// Environment variables checked for the OpenRouter credential, in order.
const API_KEY_ENV_VARS: [&str; 2] = ["OPENROUTER_API_KEY", "MODBOT_OPENROUTER_API_KEY"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "no OpenRouter API key configured; set OPENROUTER_API_KEY (environment or .env file) \
         or add an \"openrouter\" entry under apiKeys in {0}"
    )]
    MissingApiKey(String),
}

/// Persisted application configuration (`config.json` under the config dir).
///
/// The file is user-maintained; modbot only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub version: String,
    pub model: Option<String>,
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

pub struct ConfigStore {
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("modbot"))
    }

    /// Load configuration from file; a missing file yields the defaults.
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Get provider API key from config file
    pub fn get_api_key(&self, provider: &str) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.api_keys.get(provider).cloned())
    }
}

/// Get the OpenRouter API key from environment or config file
pub fn get_api_key() -> Option<String> {
    for key in API_KEY_ENV_VARS {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    if let Some(config_dir) = ConfigStore::default_config_dir() {
        let store = ConfigStore::new(config_dir);
        if let Ok(Some(key)) = store.get_api_key("openrouter") {
            return Some(key);
        }
    }

    None
}

/// Resolved per-run configuration, assembled once at startup and passed into
/// each component at construction. No pipeline code reads the environment or
/// the config store after this point.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub http_timeout: Duration,
    pub app_referer: String,
    pub app_title: String,
}

impl RunConfig {
    /// Build a RunConfig with defaults for everything but the credential.
    /// Integration tests use this and then override `api_url`.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: Duration::from_secs(DEFAULT_BATCH_PAUSE_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            app_referer: "http://localhost".to_string(),
            app_title: "modbot".to_string(),
        }
    }

    /// Resolve the run configuration from CLI overrides, the environment and
    /// the config store. Precedence: CLI > environment > config file >
    /// built-in defaults. A missing credential is fatal.
    pub fn resolve(
        cli_model: Option<String>,
        cli_batch_size: Option<usize>,
        cli_batch_pause_secs: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let api_key = get_api_key().ok_or_else(|| {
            let path = ConfigStore::default_config_dir()
                .map(|p| p.join("config.json").display().to_string())
                .unwrap_or_else(|| "the config file".to_string());
            ConfigError::MissingApiKey(path)
        })?;

        let stored = ConfigStore::default_config_dir()
            .map(ConfigStore::new)
            .and_then(|store| store.load().ok())
            .unwrap_or_default();

        let mut config = Self::with_api_key(api_key);

        if let Ok(url) = env::var("OPENROUTER_API_URL") {
            if !url.trim().is_empty() {
                config.api_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        config.model = cli_model
            .or(stored.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        config.batch_size = cli_batch_size
            .or(stored.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE)
            .max(1);
        if let Some(secs) = cli_batch_pause_secs {
            config.batch_pause = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
