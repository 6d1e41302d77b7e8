//! TOML-based session configuration.
//!
//! Holds everything a session needs before it starts:
//! - Global preparation and ready timing
//! - The training plans, in file order
//! - Status view refresh and announcer polling intervals
//! - The speech command and the spoken phrase templates
//!
//! Configuration lives at `~/.config/drillclock/config.toml` unless a path is
//! given explicitly. Files ending in `.json` are read with the same schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::plan::{GlobalTiming, TrainingPlan};

/// Status view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Milliseconds between two renders of the status table.
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

/// Announcement consumer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncerConfig {
    /// Milliseconds the consumer waits for an item before re-checking
    /// whether every producer has finished.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

/// Speech output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Program and arguments used to speak a line; the text is appended as
    /// the last argument. When absent, announcements are printed instead.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

/// Spoken phrase templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phrases {
    #[serde(default = "default_begins")]
    pub begins: String,
    /// `{round}` is replaced with the 1-based round number.
    #[serde(default = "default_ready")]
    pub ready: String,
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_down")]
    pub down: String,
    #[serde(default = "default_complete")]
    pub complete: String,
    #[serde(default = "default_finished")]
    pub finished: String,
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Preparation before the first round, in seconds.
    #[serde(default)]
    pub prepare_time: u64,
    /// Pause between "ready" and "start", in seconds.
    #[serde(default)]
    pub ready_time: u64,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub announcer: AnnouncerConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub phrases: Phrases,
    #[serde(default)]
    pub plans: IndexMap<String, TrainingPlan>,
}

// Default functions
fn default_refresh_ms() -> u64 {
    500
}
fn default_poll_ms() -> u64 {
    500
}
fn default_begins() -> String {
    "training begins".into()
}
fn default_ready() -> String {
    "round {round} ready".into()
}
fn default_start() -> String {
    "start".into()
}
fn default_down() -> String {
    "down".into()
}
fn default_complete() -> String {
    "all rounds complete".into()
}
fn default_finished() -> String {
    "all training complete".into()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
        }
    }
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            poll_ms: default_poll_ms(),
        }
    }
}

impl Default for Phrases {
    fn default() -> Self {
        Self {
            begins: default_begins(),
            ready: default_ready(),
            start: default_start(),
            down: default_down(),
            complete: default_complete(),
            finished: default_finished(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prepare_time: 0,
            ready_time: 0,
            view: ViewConfig::default(),
            announcer: AnnouncerConfig::default(),
            speech: SpeechConfig::default(),
            phrases: Phrases::default(),
            plans: IndexMap::new(),
        }
    }
}

impl Phrases {
    /// The "ready" prompt for a 1-based round number.
    pub fn ready_for(&self, round: u32) -> String {
        self.ready.replace("{round}", &round.to_string())
    }
}

impl ViewConfig {
    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

impl AnnouncerConfig {
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Returns `~/.config/drillclock[-dev]/` based on DRILLCLOCK_ENV.
///
/// Set DRILLCLOCK_ENV=dev to use a development config directory.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .ok_or(ConfigError::NoConfigDir)?;

    let env = std::env::var("DRILLCLOCK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("drillclock-dev")
    } else {
        base_dir.join("drillclock")
    };
    Ok(dir)
}

impl Config {
    /// A starter configuration with two programs.
    pub fn sample() -> Self {
        let mut plans = IndexMap::new();
        plans.insert("pistol".to_string(), TrainingPlan::new(5, 10, 20));
        plans.insert("rifle".to_string(), TrainingPlan::new(3, 30, 60));
        Self {
            prepare_time: 10,
            ready_time: 3,
            plans,
            ..Self::default()
        }
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join("config.toml"))
    }

    pub fn timing(&self) -> GlobalTiming {
        GlobalTiming {
            prepare_time: self.prepare_time,
            ready_time: self.ready_time,
        }
    }

    /// Parse a config from text, choosing JSON or TOML by `is_json`.
    ///
    /// The result is validated before it is returned.
    pub fn parse(content: &str, is_json: bool) -> Result<Self, ConfigError> {
        let cfg: Config = if is_json {
            serde_json::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?
        } else {
            toml::from_str(content)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate the config at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        Self::parse(&content, is_json)
    }

    /// Load from `path` if given, otherwise from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load_from(&Self::path()?),
        }
    }

    /// Persist as TOML to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_err = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_err(e.to_string()))
    }

    /// Write the sample config to `path`, refusing to overwrite unless `force`.
    pub fn init(path: &Path, force: bool) -> Result<Self, ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let cfg = Self::sample();
        cfg.save_to(path)?;
        Ok(cfg)
    }

    /// Reject configs the session cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plans.is_empty() {
            return Err(ConfigError::MissingKey("plans".into()));
        }
        for name in self.plans.keys() {
            if name.trim().is_empty() {
                return Err(invalid("plans", "program names must not be blank"));
            }
        }
        if self.view.refresh_ms == 0 {
            return Err(invalid("view.refresh_ms", "must be greater than zero"));
        }
        if self.announcer.poll_ms == 0 {
            return Err(invalid("announcer.poll_ms", "must be greater than zero"));
        }
        if let Some(command) = &self.speech.command {
            if command.first().map_or(true, |program| program.trim().is_empty()) {
                return Err(invalid("speech.command", "must name a program"));
            }
        }
        let phrases = [
            ("phrases.begins", &self.phrases.begins),
            ("phrases.ready", &self.phrases.ready),
            ("phrases.start", &self.phrases.start),
            ("phrases.down", &self.phrases.down),
            ("phrases.complete", &self.phrases.complete),
            ("phrases.finished", &self.phrases.finished),
        ];
        for (key, text) in phrases {
            if text.trim().is_empty() {
                return Err(invalid(key, "phrase must not be empty"));
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        message: message.into(),
    }
}
