//! Configuration management
//!
//! Default config location: ~/.esmap/config.toml

use crate::error::EsMapError;
use crate::mapping::MappingOptions;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    /// Default walker options, OR-ed with per-call switches
    #[serde(default)]
    pub mapping: MappingOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_level")]
    pub level: String,
    /// Log output format: "pretty" or "json"
    /// Override with LOG_FORMAT env var
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".esmap")
}

impl Config {
    /// Load config from default location (~/.esmap/config.toml)
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_dir())
    }

    /// Load `config.toml` from a directory, or defaults when it is missing
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::read(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load config from file path, or create default
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        let config_path = expand_tilde(config_path)?;
        if config_path.exists() {
            Self::read(&config_path)
        } else {
            let config = Config::default();
            // Best effort: a read-only home should not prevent running
            let _ = config.save(&config_path);
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(EsMapError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{other}\""
            ))),
        }
    }
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    let home = || {
        dirs::home_dir().ok_or_else(|| EsMapError::Config("Cannot determine home directory".into()))
    };
    if let Some(rest) = s.strip_prefix("~/") {
        Ok(home()?.join(rest))
    } else if s == "~" {
        home()
    } else {
        Ok(path.to_path_buf())
    }
}
