//! Core error types for drillclock-core.
//!
//! Configuration faults are fatal and surface before a session starts.
//! Speech and runner faults are contained by the supervisor: they are logged
//! and never bring the whole session down.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for drillclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Announcement pipeline errors
    #[error("Announcement error: {0}")]
    Announce(#[from] AnnounceError),

    /// Speech engine errors
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    /// A program runner aborted
    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Configuration file already exists and would be overwritten
    #[error("Configuration already exists at {0}")]
    AlreadyExists(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home directory could not be determined
    #[error("Cannot determine configuration directory")]
    NoConfigDir,
}

/// Announcement channel errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnounceError {
    /// The consumer side of the channel has been dropped.
    #[error("announcement consumer is gone; dropped '{0}'")]
    ConsumerGone(String),
}

/// Speech engine errors.
#[derive(Error, Debug)]
pub enum SpeechError {
    /// The speech command could not be started
    #[error("Failed to launch speech command '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The speech command ran but reported failure
    #[error("Speech command '{command}' exited with {status}")]
    Exited { command: String, status: String },

    /// The blocking speech call panicked or was cancelled
    #[error("Speech call aborted: {0}")]
    Aborted(String),

    /// Engine-specific failure
    #[error("{0}")]
    Engine(String),
}

/// Failures that abort a single program runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// An announcement could not be published
    #[error("program '{program}' could not announce: {source}")]
    Announce {
        program: String,
        #[source]
        source: AnnounceError,
    },

    /// The runner task panicked
    #[error("program '{program}' panicked: {message}")]
    Panicked { program: String, message: String },
}

impl RunnerError {
    pub fn program(&self) -> &str {
        match self {
            RunnerError::Announce { program, .. } | RunnerError::Panicked { program, .. } => program,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
