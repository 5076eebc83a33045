//! Engine settings
//!
//! Layered with the `config` crate:
//! `config/default` → `config/{env}` → `BOOKING_AGENT__*` environment variables.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::store::PolicyStore;
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub sessions: SessionSettings,

    /// Restaurant YAML; the bundled one when unset
    #[serde(default)]
    pub restaurant_path: Option<String>,
}

/// Log output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Per-conversation session limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Slot change log entries kept per conversation
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    200
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                message: format!("Unknown level '{}'", self.logging.level),
            });
        }

        if self.sessions.history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sessions.history_limit".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if let Some(path) = &self.restaurant_path {
            if path.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "restaurant_path".to_string(),
                    message: "Must not be empty when set".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Load the policy store these settings point at
    pub fn load_policy(&self) -> Result<PolicyStore, ConfigError> {
        match &self.restaurant_path {
            Some(path) => PolicyStore::load(path),
            None => PolicyStore::builtin(),
        }
    }
}

/// Load settings from `config/default`, `config/{env}` and the environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name(&format!("{}/default", dir)).required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("{}/{}", dir, env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("BOOKING_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.logging.level, "info");
        assert!(!settings.logging.json);
        assert_eq!(settings.sessions.history_limit, 200);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.logging.level = "loud".to_string();
        assert!(settings.validate().is_err());

        settings.logging.level = "DEBUG".to_string();
        assert!(settings.validate().is_ok());

        settings.sessions.history_limit = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_layered_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.yaml"),
            "logging:\n  level: warn\nsessions:\n  history_limit: 50\n",
        )
        .unwrap();
        fs::write(dir.path().join("production.yaml"), "logging:\n  json: true\n").unwrap();

        let path = dir.path().to_string_lossy().to_string();
        let settings = load_settings_from(&path, Some("production")).unwrap();
        assert_eq!(settings.logging.level, "warn");
        assert!(settings.logging.json);
        assert_eq!(settings.sessions.history_limit, 50);
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();
        let settings = load_settings_from(&path, None).unwrap();
        assert_eq!(settings.sessions.history_limit, 200);
    }

    #[test]
    fn test_load_builtin_policy() {
        let settings = Settings::default();
        let store = settings.load_policy().unwrap();
        assert!(!store.rice_catalog.is_empty());
    }
}
