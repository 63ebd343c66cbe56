use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::score::{SpeedRule, INITIAL_SPEED_MS, MIN_SPEED_MS, SPEED_STEP_MS};

pub const PACING_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// What `resume()` does with the challenge that was on screen at pause time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResumePolicy {
    /// Keep the paused challenge and pick the countdown up where it stopped.
    #[default]
    Continue,
    /// Throw the paused challenge away and deal a new one.
    Regenerate,
}

/// Engine settings, validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub speed: SpeedRule,
    pub pacing_delay: Duration,
    pub progress_interval: Duration,
    pub readout_interval: Duration,
    pub resume_policy: ResumePolicy,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            speed: SpeedRule::default(),
            pacing_delay: Duration::from_millis(PACING_DELAY_MS),
            progress_interval: crate::timer::PROGRESS_INTERVAL,
            readout_interval: crate::timer::READOUT_INTERVAL,
            resume_policy: ResumePolicy::Continue,
        }
    }
}

impl Tuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speed.min_ms < MIN_SPEED_MS {
            return Err(ConfigError::Invalid(format!(
                "minimum speed {}ms is below the {MIN_SPEED_MS}ms floor",
                self.speed.min_ms
            )));
        }
        if self.speed.min_ms > self.speed.initial_ms {
            return Err(ConfigError::Invalid(format!(
                "minimum speed {}ms exceeds initial speed {}ms",
                self.speed.min_ms, self.speed.initial_ms
            )));
        }
        if self.speed.step_ms == 0 {
            return Err(ConfigError::Invalid("speed step must be positive".into()));
        }
        if self.progress_interval.is_zero() || self.readout_interval.is_zero() {
            return Err(ConfigError::Invalid("tick intervals must be positive".into()));
        }
        Ok(())
    }
}

/// Persisted settings file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub initial_speed_ms: u64,
    pub min_speed_ms: u64,
    pub speed_step_ms: u64,
    pub pacing_delay_ms: u64,
    pub progress_interval_ms: u64,
    pub readout_interval_ms: u64,
    pub resume_policy: ResumePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_speed_ms: INITIAL_SPEED_MS,
            min_speed_ms: MIN_SPEED_MS,
            speed_step_ms: SPEED_STEP_MS,
            pacing_delay_ms: PACING_DELAY_MS,
            progress_interval_ms: 50,
            readout_interval_ms: 100,
            resume_policy: ResumePolicy::Continue,
        }
    }
}

impl Config {
    pub fn tuning(&self) -> Result<Tuning, ConfigError> {
        let tuning = Tuning {
            speed: SpeedRule {
                initial_ms: self.initial_speed_ms,
                min_ms: self.min_speed_ms,
                step_ms: self.speed_step_ms,
            },
            pacing_delay: Duration::from_millis(self.pacing_delay_ms),
            progress_interval: Duration::from_millis(self.progress_interval_ms),
            readout_interval: Duration::from_millis(self.readout_interval_ms),
            resume_policy: self.resume_policy,
        };
        tuning.validate()?;
        Ok(tuning)
    }
}

pub trait ConfigStore {
    /// Stored config, or defaults when missing or unreadable.
    fn load(&self) -> Config;
    fn try_load(&self) -> Result<Config, ConfigError>;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "reflex") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("reflex_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match self.try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::debug!(path = %self.path.display(), %err, "using default config");
                Config::default()
            }
        }
    }

    fn try_load(&self) -> Result<Config, ConfigError> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice::<Config>(&bytes)?)
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
