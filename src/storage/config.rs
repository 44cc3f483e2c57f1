//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_parent_dir};

/// Environment variable holding a Google Sheets OAuth bearer token
pub const SHEETS_TOKEN_ENV: &str = "GOOGLE_SHEETS_TOKEN";

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load the config at ~/.esg-survey/config.json, creating defaults on first run
    pub fn new() -> AppResult<Self> {
        Self::with_path(config_path()?)
    }

    /// Load the config at an explicit path, creating defaults if it does not exist
    pub fn with_path(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        ensure_parent_dir(&config_path)?;

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            tracing::info!(path = %config_path.display(), "created default config");
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Configuration with secrets filled in from the environment.
    ///
    /// The API key comes from the provider's conventional variable when the
    /// file does not set one. Resolved secrets are never written back to disk.
    pub fn resolved_config(&self) -> AppConfig {
        let mut config = self.config.clone();
        if config.provider.api_key.is_none() {
            config.provider.api_key = config
                .provider
                .provider
                .api_key_env()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.trim().is_empty());
        }
        config
    }

    /// Replace and persist the configuration
    pub fn set_config(&mut self, config: AppConfig) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &config)?;
        self.config = config;
        Ok(())
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.config = AppConfig::default();
        self.save()?;
        Ok(())
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        self.config_path.exists() && self.config.validate().is_ok()
    }
}

/// Google Sheets token from the environment, if set
pub fn sheets_token_from_env() -> Option<String> {
    std::env::var(SHEETS_TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
}
