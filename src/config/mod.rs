//! Configuration management

pub mod commands;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "bengdict";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub lookup: LookupConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub dictionary: DictionaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Default API provider (openai, claude, ollama)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// OpenAI API key
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL
    #[serde(default)]
    pub openai_api_base: Option<String>,

    /// OpenAI model
    #[serde(default)]
    pub openai_model: Option<String>,

    /// Anthropic API key
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    /// Anthropic API base URL
    #[serde(default)]
    pub anthropic_api_base: Option<String>,

    /// Anthropic model
    #[serde(default)]
    pub anthropic_model: Option<String>,

    /// Ollama API base URL
    #[serde(default = "default_ollama_base")]
    pub ollama_api_base: String,

    /// Ollama model
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_ollama_base() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai_api_key: None,
            openai_api_base: None,
            openai_model: None,
            anthropic_api_key: None,
            anthropic_api_base: None,
            anthropic_model: None,
            ollama_api_base: default_ollama_base(),
            ollama_model: default_ollama_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Language generated entries are translated into
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Per-request timeout for the model call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry a failed model call once before giving up
    #[serde(default = "default_retry")]
    pub retry: bool,

    /// Pause before the retry, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_target_language() -> String {
    "Bengali".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_retry() -> bool {
    true
}

fn default_retry_delay_ms() -> u64 {
    250
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            timeout_secs: default_timeout_secs(),
            retry: default_retry(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Database file for generated entries (defaults to the user data dir)
    #[serde(default)]
    pub database: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DictionaryConfig {
    /// JSON file with extra curated entries merged into the local dictionary
    #[serde(default)]
    pub extra_entries: Option<String>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config path")?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<PathBuf> {
        let dir = Self::config_dir().context("Could not determine config directory")?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content).context("Failed to write config file")?;

        Ok(path)
    }

    /// Get API key for the specified provider
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        match provider.to_lowercase().as_str() {
            "openai" => self
                .api
                .openai_api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok()),
            "claude" | "anthropic" => self
                .api
                .anthropic_api_key
                .clone()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok()),
            _ => None,
        }
    }

    /// Get API base URL for the specified provider
    pub fn get_api_base(&self, provider: &str) -> Option<String> {
        match provider.to_lowercase().as_str() {
            "openai" => self.api.openai_api_base.clone(),
            "claude" | "anthropic" => self.api.anthropic_api_base.clone(),
            "ollama" => Some(self.api.ollama_api_base.clone()),
            _ => None,
        }
    }

    /// Get model for the specified provider
    pub fn get_model(&self, provider: &str) -> Option<String> {
        match provider.to_lowercase().as_str() {
            "openai" => self.api.openai_model.clone(),
            "claude" | "anthropic" => self.api.anthropic_model.clone(),
            "ollama" => Some(self.api.ollama_model.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[api]
provider = "ollama"

[lookup]
timeout_secs = 3
"#,
        )
        .unwrap();

        assert_eq!(config.api.provider, "ollama");
        assert_eq!(config.api.ollama_model, "llama3");
        assert_eq!(config.lookup.timeout_secs, 3);
        assert_eq!(config.lookup.target_language, "Bengali");
        assert!(config.lookup.retry);
        assert!(config.storage.database.is_none());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.storage.database = Some("/tmp/dict.db".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.storage.database.as_deref(), Some("/tmp/dict.db"));
        assert_eq!(parsed.lookup.retry_delay_ms, 250);
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = Config::default();
        assert!(config.get_api_key("ollama").is_none());
        assert_eq!(
            config.get_api_base("ollama").as_deref(),
            Some("http://localhost:11434")
        );
    }
}
