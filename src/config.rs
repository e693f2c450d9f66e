// src/config.rs
use crate::error::{GaugeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "codegauge.toml";

/// Directories nobody wants analyzed.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "vendor",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".cache",
    "third_party",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Files larger than this (in bytes) are skipped.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_excludes")]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub include_patterns: Vec<String>,
    /// Queue capacity as a multiple of the worker count.
    #[serde(default = "default_queue_multiplier")]
    pub queue_multiplier: usize,
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            max_file_size: default_max_file_size(),
            exclude_patterns: default_excludes(),
            include_patterns: Vec::new(),
            queue_multiplier: default_queue_multiplier(),
            respect_gitignore: true,
        }
    }
}

fn default_max_workers() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

const fn default_max_file_size() -> u64 {
    1024 * 1024
}

const fn default_queue_multiplier() -> usize {
    2
}

const fn default_true() -> bool {
    true
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect()
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `codegauge.toml` from `root`, falling back to defaults when absent.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| GaugeError::Io {
            source,
            path: path.clone(),
        })?;
        let config = Self::parse_toml(&content).map_err(|source| GaugeError::Toml { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// Returns the TOML error on malformed input.
    pub fn parse_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Validates configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a zero worker count, size ceiling or queue multiplier.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(GaugeError::InvalidConfig("max_workers must be at least 1".into()));
        }
        if self.max_file_size == 0 {
            return Err(GaugeError::InvalidConfig("max_file_size must be positive".into()));
        }
        if self.queue_multiplier == 0 {
            return Err(GaugeError::InvalidConfig("queue_multiplier must be at least 1".into()));
        }
        Ok(())
    }

    /// Capacity of each pool queue.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.max_workers.max(1) * self.queue_multiplier.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::parse_toml("max_workers = 3\ninclude_patterns = [\"*.py\"]").unwrap();
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.include_patterns, vec!["*.py".to_string()]);
        assert_eq!(config.max_file_size, default_max_file_size());
        assert!(config.exclude_patterns.contains(&"vendor".to_string()));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = Config {
            max_workers: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(GaugeError::InvalidConfig(_))));
    }

    #[test]
    fn test_queue_capacity() {
        let config = Config {
            max_workers: 4,
            queue_multiplier: 3,
            ..Config::default()
        };
        assert_eq!(config.queue_capacity(), 12);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "max_workers = \"many\"").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(GaugeError::Toml { .. })));
    }
}
