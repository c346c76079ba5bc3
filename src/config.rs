//! Configuration loading and management for regionlore.
//!
//! Loads settings from `regionlore.toml` with environment variable overrides for sensitive data.

use crate::prompt::{PromptTemplate, DEFAULT_TEMPLATE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the generative-language API key
pub const API_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_KEY";
pub const AUTH_URL_ENV: &str = "SUPABASE_URL";
pub const AUTH_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

const CONFIG_FILE: &str = "regionlore.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("auth service is not configured (set SUPABASE_URL and SUPABASE_ANON_KEY)")]
    MissingAuthSettings,
    #[error("prompt template must contain the {{region}} placeholder")]
    InvalidPrompt,
}

/// Generative-language provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API host, without the version path
    pub base_url: String,
    /// Model identifier (e.g., "gemini-flash-latest")
    pub model: String,
    /// Prompt template; `{region}` is replaced by the requested region
    pub prompt: String,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
}

/// Authentication service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from the default location (regionlore.toml in cwd or home).
    ///
    /// Falls back to defaults when no file exists; environment overrides apply either way.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::read(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.prompt_template()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Override secrets from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.api.gemini_key = Some(key);
        }
        if let Ok(url) = std::env::var(AUTH_URL_ENV) {
            self.auth.url = Some(url);
        }
        if let Ok(key) = std::env::var(AUTH_ANON_KEY_ENV) {
            self.auth.anon_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("regionlore")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }

    /// Get the provider API key. An empty key counts as missing.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api
            .gemini_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string()))
    }

    /// The validated prompt template
    pub fn prompt_template(&self) -> Result<PromptTemplate, ConfigError> {
        PromptTemplate::new(&self.provider.prompt)
    }

    /// Auth service URL and anon key, both required
    pub fn auth_settings(&self) -> Result<(&str, &str), ConfigError> {
        let url = self.auth.url.as_deref().filter(|u| !u.is_empty());
        let key = self.auth.anon_key.as_deref().filter(|k| !k.is_empty());
        match (url, key) {
            (Some(url), Some(key)) => Ok((url, key)),
            _ => Err(ConfigError::MissingAuthSettings),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-flash-latest".to_string(),
            prompt: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.provider.model, "gemini-flash-latest");
        assert_eq!(
            config.provider.base_url,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.provider.prompt, DEFAULT_TEMPLATE);
        assert!(config.api.gemini_key.is_none());
    }

    #[test]
    fn partial_provider_section_keeps_other_defaults() {
        let config = Config::parse(
            r#"
[provider]
model = "gemini-2.5-flash"
"#,
        )
        .unwrap();
        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.provider.prompt, DEFAULT_TEMPLATE);
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let mut config = Config::default();
        config.api.gemini_key = Some("   ".to_string());
        assert!(matches!(
            config.api_key(),
            Err(ConfigError::MissingApiKey(p)) if p == "gemini"
        ));

        config.api.gemini_key = Some("secret".to_string());
        assert_eq!(config.api_key().unwrap(), "secret");
    }

    #[test]
    fn prompt_without_placeholder_is_rejected() {
        let err = Config::parse(
            r#"
[provider]
prompt = "Tell me some history."
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrompt));
    }

    #[test]
    fn auth_settings_require_url_and_key() {
        let mut config = Config::default();
        assert!(matches!(
            config.auth_settings(),
            Err(ConfigError::MissingAuthSettings)
        ));

        config.auth.url = Some("https://project.supabase.co".to_string());
        assert!(config.auth_settings().is_err());

        config.auth.anon_key = Some("anon".to_string());
        assert_eq!(
            config.auth_settings().unwrap(),
            ("https://project.supabase.co", "anon")
        );
    }

    #[test]
    fn reads_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[provider]
base_url = "http://localhost:9999"

[auth]
url = "http://localhost:54321"
"#
        )
        .unwrap();

        let config = Config::read(file.path()).unwrap();
        assert_eq!(config.provider.base_url, "http://localhost:9999");
        assert_eq!(config.auth.url.as_deref(), Some("http://localhost:54321"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::read(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }
}
