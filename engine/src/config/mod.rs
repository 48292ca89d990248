//! Configuration management
//!
//! This module handles loading, validation, and management of the BookWorm
//! configuration. Configuration is stored in TOML format at
//! ~/.bookworm/config.toml and created with defaults on first run.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **server**: HTTP bind address for the channel endpoint
//! - **llm**: Completion API endpoint and model
//! - **conversation**: History cap and persona text
//! - **bot**: Fixed welcome and apology texts
//!
//! # Environment Overrides
//!
//! After the file is parsed, these variables replace file values when set:
//! `PORT`, `OPENAI_MODEL`, `OPENAI_BASE_URL`, `BOOKWORM_LOG_LEVEL`.
//! Credentials are never read from the file; see [`crate::secrets`].
//!
//! # Examples
//!
//! ```no_run
//! use bookworm_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (config, _created) = Config::load_or_create()?;
//! println!("Model: {}", config.llm.openai.model);
//! println!("History cap: {}", config.conversation.max_turns);
//! # Ok(())
//! # }
//! ```

use crate::bot::{DEFAULT_APOLOGY_TEXT, DEFAULT_WELCOME_TEXT};
use crate::conversation::{DEFAULT_MAX_TURNS, DEFAULT_PERSONA};
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion API configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Conversation buffer settings
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Fixed bot texts
    #[serde(default)]
    pub bot: BotConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Completion provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LLMConfig {
    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for the OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,
    // Note: API key read from OPENAI_API_KEY, never from config
}

/// Conversation buffer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum number of turns kept after each user message
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// System turn seeded into every new conversation
    #[serde(default = "default_persona")]
    pub persona: String,
}

/// Fixed bot texts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Sent once for every member added to a conversation
    #[serde(default = "default_welcome_text")]
    pub welcome_text: String,

    /// Sent when the completion call fails
    #[serde(default = "default_apology_text")]
    pub apology_text: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3978
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_string()
}

fn default_welcome_text() -> String {
    DEFAULT_WELCOME_TEXT.to_string()
}

fn default_apology_text() -> String {
    DEFAULT_APOLOGY_TEXT.to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            persona: default_persona(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            welcome_text: default_welcome_text(),
            apology_text: default_apology_text(),
        }
    }
}

impl ServerConfig {
    /// Socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr, EngineError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| EngineError::Config(format!("Invalid server address: {}", e)))
    }
}

impl Config {
    /// Load configuration from the default location (~/.bookworm/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    /// Environment overrides are applied and the result validated. The flag is
    /// true when the file was written by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<(Self, bool), EngineError> {
        Self::load_or_create_at(&Self::default_config_path()?)
    }

    /// Same as [`Config::load_or_create`] for an explicit path
    pub fn load_or_create_at(path: &Path) -> Result<(Self, bool), EngineError> {
        if path.exists() {
            Ok((Self::load_from_path(path)?, false))
        } else {
            Ok((Self::create_default(path)?, true))
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration text without consulting the environment
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.bookworm/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".bookworm").join("config.toml"))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value '{}'", port),
            }
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.llm.openai.model = model;
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.llm.openai.base_url = base_url;
        }
        if let Some(level) = lookup("BOOKWORM_LOG_LEVEL") {
            self.core.log_level = level.to_lowercase();
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log level is unknown
    /// - `max_turns` is zero
    /// - The model name or base URL is empty
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.conversation.max_turns == 0 {
            return Err(EngineError::Config(
                "conversation.max_turns must be at least 1".to_string(),
            ));
        }

        if self.llm.openai.model.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.openai.model must not be empty".to_string(),
            ));
        }

        if self.llm.openai.base_url.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.openai.base_url must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.server.port, 3978);
        assert_eq!(config.llm.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.conversation.max_turns, 10);
        assert!(config.conversation.persona.contains("BookWorm"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.conversation.max_turns, DEFAULT_MAX_TURNS);
        assert_eq!(config.bot.apology_text, DEFAULT_APOLOGY_TEXT);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
[conversation]
max_turns = 4

[bot]
welcome_text = "Hi!"
"#,
        )
        .unwrap();

        assert_eq!(config.conversation.max_turns, 4);
        assert_eq!(config.conversation.persona, DEFAULT_PERSONA);
        assert_eq!(config.bot.welcome_text, "Hi!");
        assert_eq!(config.bot.apology_text, DEFAULT_APOLOGY_TEXT);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8080"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("BOOKWORM_LOG_LEVEL", "DEBUG"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.openai.model, "gpt-4o");
        assert_eq!(config.core.log_level, "debug");
        assert_eq!(config.llm.openai.base_url, default_openai_base_url());
    }

    #[test]
    fn test_invalid_port_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 3978);
    }

    #[test]
    fn test_validation_rejects_zero_turns() {
        let mut config = Config::default();
        config.conversation.max_turns = 0;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let mut config = Config::default();
        config.core.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 4000,
        };
        assert_eq!(server.socket_addr().unwrap().port(), 4000);

        let bad = ServerConfig {
            host: "not a host".to_string(),
            port: 4000,
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.conversation.persona, deserialized.conversation.persona);
    }
}
