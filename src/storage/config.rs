//! Configuration handling for shard-order
//!
//! Configuration is read from the file given with `--config` (or
//! `SHARD_ORDER_CONFIG`), falling back to `~/.config/shard-order/config.toml`
//! and then to built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{OrderError, Orderer, ParentsFirst, Shuffle};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Ordering strategy for lease assignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Parents before children, optionally bounded by depth
    #[default]
    ParentsFirst,
    /// Random order
    Shuffle,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for shard ordering
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OrderingConfig {
    /// Strategy to order with
    pub strategy: StrategyKind,

    /// Deepest shard parents-first will hand out (unbounded if absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,

    /// Fixed shuffle seed (thread-local randomness if absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl OrderingConfig {
    /// Builds the configured strategy
    pub fn orderer(&self) -> Result<Orderer, OrderError> {
        match self.strategy {
            StrategyKind::ParentsFirst => {
                let strategy = match self.max_depth {
                    Some(max_depth) => ParentsFirst::new(max_depth)?,
                    None => ParentsFirst::unbounded(),
                };
                Ok(Orderer::ParentsFirst(strategy))
            }
            StrategyKind::Shuffle => Ok(Orderer::Shuffle(match self.seed {
                Some(seed) => Shuffle::seeded(seed),
                None => Shuffle::new(),
            })),
        }
    }

    /// Checks values that do not depend on the selected strategy
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.max_depth {
            Some(max_depth) if max_depth <= 0 => Err(ConfigError::Invalid(format!(
                "ordering.max_depth must be positive, got {}",
                max_depth
            ))),
            _ => Ok(()),
        }
    }
}

/// Combined configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Ordering settings
    pub ordering: OrderingConfig,
}

impl Config {
    /// Loads configuration from an explicit path, or from the default location
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Loads configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to load config: {}", path.display()))
    }

    /// Parses and validates configuration from TOML
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.ordering.validate()?;
        Ok(config)
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "shard-order", "shard-order")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the default config file path
    pub fn default_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Serializes the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
