use serde::{Deserialize, Serialize};

/// Whole seconds on a boot-relative monotonic clock.
pub type MonotonicSecs = u64;

/// The discharge-session accumulator: the only state the tracker owns.
///
/// Field names on disk follow the cache file format:
/// `{"unplugMonotonic", "accumulatedRuntime", "lastUpdateMonotonic",
///   "batteryPercent", "startPercent"}`. Missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorState {
    /// When the current discharge session began; `None` = no session.
    #[serde(rename = "unplugMonotonic")]
    pub unplug_timestamp: Option<MonotonicSecs>,
    /// Seconds counted toward the current session.
    #[serde(rename = "accumulatedRuntime")]
    pub accumulated_seconds: u64,
    /// Last time a delta was folded into `accumulated_seconds`.
    #[serde(rename = "lastUpdateMonotonic")]
    pub last_sample_timestamp: Option<MonotonicSecs>,
    /// Battery percentage at the last state-change evaluation.
    #[serde(rename = "batteryPercent")]
    pub last_observed_percent: Option<f64>,
    /// Rounded battery percentage when the session began (display only).
    #[serde(rename = "startPercent")]
    pub session_start_percent: Option<u8>,
}

impl AccumulatorState {
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.unplug_timestamp.is_some()
    }

    /// Drop the current session. `last_observed_percent` is kept: the caller
    /// overwrites it after every evaluation anyway.
    pub fn end_session(&mut self) {
        self.unplug_timestamp = None;
        self.accumulated_seconds = 0;
        self.session_start_percent = None;
        self.last_sample_timestamp = None;
    }

    pub fn begin_session(&mut self, now: MonotonicSecs, percent: f64) {
        self.unplug_timestamp = Some(now);
        self.last_sample_timestamp = Some(now);
        self.accumulated_seconds = 0;
        self.session_start_percent = Some(round_percent(percent));
    }

    /// Enforce "no session ⇒ nothing accumulated" on state read from disk.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.unplug_timestamp.is_none() {
            self.accumulated_seconds = 0;
            self.session_start_percent = None;
        }
        self
    }
}

/// One instantaneous query of the power subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerReading {
    /// `true` only while the battery reports "discharging".
    pub on_battery: bool,
    /// Charge level (0.0 – 100.0).
    pub percentage: f64,
    /// Native estimate of seconds left; 0 when unknown.
    pub time_to_empty_secs: u64,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuntimeSnapshot {
    pub on_battery: bool,
    pub has_active_session: bool,
    /// Seconds of discharge counted in the current session.
    pub accumulated_seconds: u64,
    /// Time since unplugged. Currently the same figure as
    /// `accumulated_seconds`; kept separate because the indicator shows both.
    pub total_seconds: u64,
    pub session_start_percent: Option<u8>,
    /// Live charge level.
    pub percentage: f64,
    pub estimated_time_to_empty_secs: u64,
}

fn round_percent(percent: f64) -> u8 {
    percent.round().clamp(0.0, 100.0) as u8
}
