use brt_core::{Result, RuntimeError, DEFAULT_RESET_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure parsed from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between runtime accumulation ticks.
    pub tick_interval_secs: u64,
    /// Seconds between sysfs polls (also the fallback when UPower is absent).
    pub poll_interval_secs: u64,
    /// Percentage-point rise that counts as a recharge while discharging.
    pub reset_threshold_percent: f64,
    /// Where change notifications come from.
    pub backend: Backend,
    /// `power_supply` entry to read, e.g. `"BAT0"`. First `BAT*` when unset.
    pub battery: Option<String>,
    /// Override for the accumulator file.
    pub state_path: Option<PathBuf>,
    /// Override for the diagnostic log.
    pub log_path: Option<PathBuf>,
    /// How snapshots are written to stdout.
    pub output: OutputMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            poll_interval_secs: 5,
            reset_threshold_percent: DEFAULT_RESET_THRESHOLD,
            backend: Backend::Auto,
            battery: None,
            state_path: None,
            log_path: None,
            output: OutputMode::Plain,
        }
    }
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 || self.poll_interval_secs == 0 {
            return Err(RuntimeError::Config("intervals must be at least 1 second".into()));
        }
        if !self.reset_threshold_percent.is_finite() || self.reset_threshold_percent < 0.0 {
            return Err(RuntimeError::Config(format!(
                "reset_threshold_percent must be a non-negative number, got {}",
                self.reset_threshold_percent
            )));
        }
        Ok(())
    }
}

/// Source of power-state change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// UPower over D-Bus, falling back to sysfs polling.
    #[default]
    Auto,
    Upower,
    Sysfs,
}

/// Presentation written to stdout on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// The panel label only, e.g. `1h 5m` or `AC`.
    #[default]
    Plain,
    /// One waybar-style JSON object per line.
    Json,
    /// Nothing; track and persist only.
    Quiet,
}
