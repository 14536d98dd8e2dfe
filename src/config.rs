//! Configuration management for netpilot
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.netpilot/config.toml

use crate::errors::{NetError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration for netpilot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion provider selection and tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// "demo" or "ollama"
    pub kind: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Per-agent memory sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub short_term_capacity: usize,
    pub retrieval_limit: usize,
}

/// Task registry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Tasks at or above this priority run as part of creation
    pub immediate_priority: i32,
}

/// Bulk fan-out sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    pub max_parallel: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: "demo".to_string(),
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            max_tokens: 2048,
            temperature: 0.2,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term_capacity: 10,
            retrieval_limit: 5,
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            immediate_priority: 5,
        }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_parallel: crate::bulk::default_parallelism(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| NetError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| NetError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location or fall back to built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// ~/.netpilot/config.toml, when a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".netpilot").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.provider.kind.as_str() {
            "demo" | "ollama" => {}
            other => {
                return Err(NetError::ConfigError(format!(
                    "Unknown provider kind: {}",
                    other
                )))
            }
        }

        if self.provider.timeout_secs == 0 {
            return Err(NetError::ConfigError(
                "provider.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(NetError::ConfigError(
                "provider.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.memory.short_term_capacity == 0 {
            return Err(NetError::ConfigError(
                "memory.short_term_capacity must be greater than 0".to_string(),
            ));
        }

        if self.bulk.max_parallel == 0 {
            return Err(NetError::ConfigError(
                "bulk.max_parallel must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(NetError::ConfigError(format!(
                    "Invalid log level: {}",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| NetError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NetError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| NetError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Provider call timeout
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.kind, "demo");
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.memory.short_term_capacity, 10);
        assert_eq!(config.memory.retrieval_limit, 5);
        assert_eq!(config.tasks.immediate_priority, 5);
        assert!(config.bulk.max_parallel >= 1);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_unknown_provider() {
        let mut config = Config::default();
        config.provider.kind = "mystery".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.provider.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_temperature() {
        let mut config = Config::default();
        config.provider.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[provider]\nkind = \"ollama\"\nmodel = \"llama3\"\n").unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.provider.kind, "ollama");
        assert_eq!(config.provider.model, "llama3");
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.memory.short_term_capacity, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.bulk.max_parallel = 3;
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.bulk.max_parallel, 3);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[memory]\nshort_term_capacity = 0\n").unwrap();

        assert!(Config::load_from_file(&path).is_err());
    }
}
