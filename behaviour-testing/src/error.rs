use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the lifecycle controller itself
///
/// Failures coming out of user hooks are never wrapped in this type; they
/// travel through `anyhow::Error` untouched so tests can downcast them.
#[derive(Debug, Error)]
pub enum BehaviourError {
    #[error("Behaviour has already been executed, the subject under test is never recreated")]
    AlreadyExecuted,

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("No strategy to synthesize {type_name}, register a factory or implement Synthesize::synthesize")]
    NoStrategy { type_name: &'static str },

    #[error("Recursion detected while synthesizing {type_name}")]
    RecursionDetected { type_name: &'static str },

    #[error("Factory for {type_name} failed: {source}")]
    Factory {
        type_name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Factory for {type_name} produced a value of another type")]
    TypeMismatch { type_name: &'static str },

    #[error("Cannot build {type_name}: {reason}")]
    Conversion {
        type_name: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Unknown layout renderer '${{{0}}}'")]
    UnknownRenderer(String),

    #[error("Unterminated layout renderer starting at offset {0}")]
    UnterminatedRenderer(usize),

    #[error("Cannot open log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Invalid log level: '{0}'")]
    InvalidLogLevel(String),

    #[error("Invalid seed: '{0}' (expected decimal or 0x-prefixed hex)")]
    InvalidSeed(String),
}
