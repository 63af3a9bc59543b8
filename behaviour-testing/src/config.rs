// File: behaviour-testing/src/config.rs
//
// Process-wide configuration for behaviour tests.
//
// Environment variables:
//   - BEHAVE_CONFIG       path to a YAML document deserialized into BehaviourConfig
//   - BEHAVE_LOG_LEVEL    off | error | warn | info | debug | trace
//   - BEHAVE_TEST_SEED    fixture seed, decimal or 0x-prefixed hex
//
// Environment variables win over the YAML document.

use crate::error::ConfigError;
use lazy_static::lazy_static;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default values for configuration
pub mod defaults {
    use super::LogLevel;

    pub const LOG_LEVEL: LogLevel = LogLevel::Warn;
    pub const LOG_LAYOUT: &str = "${message}";
    pub const REPEAT_COUNT: usize = 3;
    pub const STRING_LENGTH: usize = 12;

    // Validation limits
    pub const MAX_REPEAT_COUNT: usize = 1024;

    pub const CONFIG_ENV: &str = "BEHAVE_CONFIG";
    pub const LOG_LEVEL_ENV: &str = "BEHAVE_LOG_LEVEL";
    pub const SEED_ENV: &str = "BEHAVE_TEST_SEED";
}

/// Severity threshold handed to the logging backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.to_level_filter()
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "off" => LogLevel::Off,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => return Err(ConfigError::InvalidLogLevel(s.to_owned())),
        })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(s)
    }
}

/// Parse a fixture seed written either as decimal or as `0x`-prefixed hex
pub fn parse_seed(value: &str) -> Result<u64, ConfigError> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| ConfigError::InvalidSeed(value.to_owned()))
}

/// Configuration shared by every behaviour test in the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Default severity threshold for test loggers
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Default message layout for test loggers
    #[serde(default = "default_log_layout")]
    pub log_layout: String,

    /// Disable per-level colours on the coloured console target
    #[serde(default)]
    pub disable_log_color: bool,

    /// Number of elements generated for collections by the fixture
    #[serde(default = "default_repeat_count")]
    pub repeat_count: usize,

    /// Length of generated strings
    #[serde(default = "default_string_length")]
    pub string_length: usize,

    /// Fixed fixture seed, random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default functions for serde
fn default_log_level() -> LogLevel {
    defaults::LOG_LEVEL
}
fn default_log_layout() -> String {
    defaults::LOG_LAYOUT.to_string()
}
fn default_repeat_count() -> usize {
    defaults::REPEAT_COUNT
}
fn default_string_length() -> usize {
    defaults::STRING_LENGTH
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_layout: default_log_layout(),
            disable_log_color: false,
            repeat_count: default_repeat_count(),
            string_length: default_string_length(),
            seed: None,
        }
    }
}

impl BehaviourConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&document)
    }

    /// Apply `BEHAVE_LOG_LEVEL` and `BEHAVE_TEST_SEED` on top of this configuration
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(level) = env::var(defaults::LOG_LEVEL_ENV) {
            self.log_level = level.parse()?;
        }
        if let Ok(seed) = env::var(defaults::SEED_ENV) {
            self.seed = Some(parse_seed(&seed)?);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repeat_count == 0 || self.repeat_count > defaults::MAX_REPEAT_COUNT {
            return Err(ConfigError::Invalid {
                field: "repeat_count",
                reason: format!(
                    "{} must be between 1 and {}",
                    self.repeat_count,
                    defaults::MAX_REPEAT_COUNT
                ),
            });
        }
        if self.string_length == 0 {
            return Err(ConfigError::Invalid {
                field: "string_length",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

fn load_global() -> BehaviourConfig {
    let base = match env::var(defaults::CONFIG_ENV) {
        Ok(path) => BehaviourConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("Ignoring {}={}: {}", defaults::CONFIG_ENV, path, e);
            BehaviourConfig::default()
        }),
        Err(_) => BehaviourConfig::default(),
    };

    base.clone().with_env_overrides().unwrap_or_else(|e| {
        eprintln!("Ignoring behaviour test environment overrides: {}", e);
        base
    })
}

lazy_static! {
    static ref GLOBAL_CONFIG: BehaviourConfig = load_global();
}

/// Process-wide configuration, resolved once on first access
pub fn global() -> &'static BehaviourConfig {
    &GLOBAL_CONFIG
}
