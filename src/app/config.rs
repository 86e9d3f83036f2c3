use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_HEALTH_PORT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_NAME, DEFAULT_TEMPERATURE,
    OPENROUTER_BASE_URL,
};
use crate::models::GenerationConfig;
use crate::utils::MythosError;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Generation model configuration
    #[serde(default)]
    pub model: ModelSettings,

    /// OpenRouter configuration
    #[serde(default)]
    pub openrouter: OpenRouterSettings,

    /// Telegram configuration
    #[serde(default)]
    pub telegram: TelegramSettings,

    /// Liveness server configuration
    #[serde(default)]
    pub server: ServerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            openrouter: OpenRouterSettings::default(),
            telegram: TelegramSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

/// Generation model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model identifier on the upstream endpoint
    pub name: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL_NAME.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// OpenRouter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterSettings {
    /// Environment variable containing the API key
    pub api_key_env: String,
    /// Base URL of the completions API
    pub base_url: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            api_key_env: "OPENROUTER_KEY".to_string(),
            base_url: OPENROUTER_BASE_URL.to_string(),
        }
    }
}

/// Telegram configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    /// Environment variable containing the bot token
    pub bot_token_env: String,
    /// URL of the session-configuration mini app
    pub web_app_url: Option<String>,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token_env: "BOT_TOKEN".to_string(),
            web_app_url: None,
        }
    }
}

/// Liveness server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port the liveness endpoint binds to
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_HEALTH_PORT,
        }
    }
}

impl Config {
    /// Fixed generation parameters derived from the model section
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.model.name.clone(),
            temperature: self.model.temperature,
            max_tokens: self.model.max_tokens,
        }
    }

    /// Resolve the OpenRouter API key from the configured environment variable
    pub fn openrouter_api_key(&self) -> Result<String> {
        std::env::var(&self.openrouter.api_key_env).map_err(|_| {
            MythosError::ConfigError(format!("{} is not set", self.openrouter.api_key_env)).into()
        })
    }

    /// Resolve the Telegram bot token from the configured environment variable
    pub fn bot_token(&self) -> Result<String> {
        std::env::var(&self.telegram.bot_token_env).map_err(|_| {
            MythosError::ConfigError(format!("{} is not set", self.telegram.bot_token_env)).into()
        })
    }

    /// The mini-app URL: config value first, then the WEB_APP_URL variable
    pub fn web_app_url(&self) -> Result<String> {
        self.telegram
            .web_app_url
            .clone()
            .or_else(|| std::env::var("WEB_APP_URL").ok())
            .ok_or_else(|| {
                MythosError::ConfigError(
                    "web app URL not configured (telegram.web_app_url or WEB_APP_URL)".to_string(),
                )
                .into()
            })
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    // Get config directories
    let config_dir = get_config_dir()?;
    let global_config = config_dir.join("config.toml");
    let local_config = PathBuf::from(".mythos/config.toml");

    // Build figment configuration
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    // Add global config if it exists
    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    // Add local config if it exists
    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    // Add environment variables (MYTHOS_ prefix)
    figment = figment.merge(Env::prefixed("MYTHOS_"));

    // Extract and return config
    figment.extract().context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "mythos") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("mythos");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config_file = config_dir.join("config.toml");

    if !config_file.exists() {
        let default_config = Config::default();
        save_config(&default_config, Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    }

    Ok(())
}
