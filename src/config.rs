use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, error::InputValidationError, timer::DEFAULT_PERIOD_MS};

pub const CONFIG_PATH_ENV: &str = "REFLEX_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "reflex.json";
pub const PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
pub const API_KEY_ENV: &str = "FIREBASE_API_KEY";

/// Measurement parameters, fixed for the lifetime of a sequencer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub trials: u32,
    /// How long the cue stays on waiting for a press.
    pub window_ms: u32,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub poll_interval_ms: u64,
    pub start_blinks: u32,
    pub end_blinks: u32,
    pub blink_ms: u64,
    /// Rollover period of the tick counter.
    pub clock_period_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trials: 10,
            window_ms: 500,
            min_delay_secs: 0.5,
            max_delay_secs: 5.0,
            poll_interval_ms: 1,
            start_blinks: 3,
            end_blinks: 5,
            blink_ms: 100,
            clock_period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), InputValidationError> {
        if self.trials == 0 {
            return Err(InputValidationError::ZeroTrials);
        }
        if self.window_ms == 0 {
            return Err(InputValidationError::ZeroWindow);
        }
        validate_clock_period(self.clock_period_ms, self.window_ms)?;
        validate_delay_range(self.delay_range())
    }

    pub fn delay_range(&self) -> (f64, f64) {
        (self.min_delay_secs, self.max_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }
}

/// A window can only time out if the tick counter reaches it before wrapping.
pub fn validate_clock_period(period_ms: u64, window_ms: u32) -> Result<(), InputValidationError> {
    if period_ms <= u64::from(window_ms) {
        return Err(InputValidationError::ClockPeriodTooShort {
            period_ms,
            window_ms,
        });
    }
    Ok(())
}

/// Accepts `(min, max)` with `0 <= min <= max`, both representable as a
/// `Duration`.
pub fn validate_delay_range((min_secs, max_secs): (f64, f64)) -> Result<(), InputValidationError> {
    let valid = Duration::try_from_secs_f64(min_secs).is_ok()
        && Duration::try_from_secs_f64(max_secs).is_ok()
        && min_secs <= max_secs;
    if valid {
        Ok(())
    } else {
        Err(InputValidationError::InvalidDelayRange { min_secs, max_secs })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub results_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
        }
    }
}

/// Firestore REST endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub project_id: String,
    pub api_key: String,
    pub collection: String,
    /// Upper bound on each HTTP request, connect through body.
    pub timeout_ms: u64,
    /// Guard the write with the `updateTime` observed on fetch.
    pub conditional_writes: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://firestore.googleapis.com/v1".into(),
            project_id: String::new(),
            api_key: String::new(),
            collection: "game_results".into(),
            timeout_ms: 10_000,
            conditional_writes: true,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_configured(&self) -> bool {
        !self.project_id.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
}

impl AppConfig {
    /// Reads `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from `REFLEX_CONFIG` (or `reflex.json`) and applies credential
    /// overrides from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::load(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(project_id) = lookup(PROJECT_ID_ENV).filter(|v| !v.is_empty()) {
            self.remote.project_id = project_id;
        }
        if let Some(api_key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.remote.api_key = api_key;
        }
    }
}
