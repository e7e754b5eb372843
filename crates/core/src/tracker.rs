use crate::event::PowerEvent;
use crate::listener::{ChangeListener, ListenerId, Listeners};
use crate::source::{Clock, DiagnosticLog, PowerSource, StateStore};
use crate::state::{AccumulatorState, PowerReading, RuntimeSnapshot};
use tracing::{debug, info, warn};

/// Percentage points a reading may rise above the previous one before the
/// tracker treats it as a recharge, even while the battery still reports
/// "discharging".
pub const DEFAULT_RESET_THRESHOLD: f64 = 3.0;

/// Everything the tracker talks to, injected at construction.
pub struct TrackerDeps {
    pub power: Box<dyn PowerSource>,
    pub clock: Box<dyn Clock>,
    pub store: Box<dyn StateStore>,
    pub log: Box<dyn DiagnosticLog>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerOptions {
    /// A rise strictly greater than this many points resets the session.
    pub reset_threshold_percent: f64,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            reset_threshold_percent: DEFAULT_RESET_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Stopped,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ResetReason {
    OnAc,
    Recharged { from: f64, to: f64 },
}

/// Discharge-session accumulator and its battery state machine.
///
/// All mutation happens through [`handle_power_state_change`] and [`tick`],
/// which the owning event loop calls strictly one at a time. Every mutation is
/// persisted and then broadcast to the registered listeners.
///
/// [`handle_power_state_change`]: PowerTracker::handle_power_state_change
/// [`tick`]: PowerTracker::tick
pub struct PowerTracker {
    state: AccumulatorState,
    power: Box<dyn PowerSource>,
    clock: Box<dyn Clock>,
    store: Box<dyn StateStore>,
    log: Box<dyn DiagnosticLog>,
    listeners: Listeners,
    options: TrackerOptions,
    lifecycle: Lifecycle,
}

impl PowerTracker {
    /// Restore the accumulator from the store. Never fails: a missing or
    /// unreadable file yields an empty state.
    pub fn new(deps: TrackerDeps, options: TrackerOptions) -> Self {
        let state = deps.store.load().normalized();
        debug!(?state, "restored accumulator");

        Self {
            state,
            power: deps.power,
            clock: deps.clock,
            store: deps.store,
            log: deps.log,
            listeners: Listeners::default(),
            options,
            lifecycle: Lifecycle::Created,
        }
    }

    /// Begin accepting events and synchronise with the current hardware state.
    pub fn start(&mut self) {
        if self.lifecycle != Lifecycle::Created {
            return;
        }
        self.lifecycle = Lifecycle::Running;
        self.log.write("PowerTracker started");
        info!("power tracker started");
        self.handle_power_state_change();
    }

    /// Drop every listener and ignore all further events. Nothing is
    /// persisted after this returns.
    pub fn stop(&mut self) {
        if self.lifecycle == Lifecycle::Stopped {
            return;
        }
        self.lifecycle = Lifecycle::Stopped;
        self.listeners.clear();
        self.log.write("PowerTracker stopped");
        info!("power tracker stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn subscribe(&mut self, listener: impl ChangeListener + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    /// Returns `false` if `id` was not (or is no longer) registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Dispatch a notification from the power subsystem.
    pub fn handle_event(&mut self, event: PowerEvent) {
        match event {
            PowerEvent::StateChanged => self.handle_power_state_change(),
            PowerEvent::EstimateChanged => {
                if self.is_running() {
                    self.notify();
                }
            }
        }
    }

    /// Re-evaluate the session against a fresh reading.
    ///
    /// 1. Not on battery, or the percentage rose by more than the threshold:
    ///    the session ends.
    /// 2. On battery with no session: a new one starts now.
    /// 3. The observed percentage is recorded either way.
    pub fn handle_power_state_change(&mut self) {
        if !self.is_running() {
            return;
        }

        let reading = self.power.read();
        let now = self.clock.now();

        if let Some(reason) = self.reset_reason(&reading) {
            if self.state.has_session() {
                self.session_ended(reason);
            }
            self.state.end_session();
        }

        if reading.on_battery && !self.state.has_session() {
            self.state.begin_session(now, reading.percentage);
            let start = self.state.session_start_percent.unwrap_or_default();
            info!(start_percent = start, "discharge session started");
            self.log
                .write(&format!("session started at {start}% (t={now})"));
        }

        self.state.last_observed_percent = Some(reading.percentage);
        self.persist();
        self.notify();
    }

    /// Fold the time since the last sample into the session. Called by the
    /// recurring timer; a no-op unless a session is running on battery.
    pub fn tick(&mut self) {
        if !self.is_running() || !self.state.has_session() {
            return;
        }
        if !self.power.read().on_battery {
            return;
        }

        let now = self.clock.now();
        if let Some(last) = self.state.last_sample_timestamp {
            // A clock that stalled or went backwards contributes nothing.
            let delta = now.saturating_sub(last);
            self.state.accumulated_seconds = self.state.accumulated_seconds.saturating_add(delta);
            if now < last {
                debug!(now, last, "monotonic clock behind last sample; delta ignored");
            }
        }
        self.state.last_sample_timestamp = Some(now);

        self.persist();
        self.notify();
    }

    /// Side-effect-free view for the presentation layer. `on_battery`, the
    /// percentage and the time-to-empty estimate are read live.
    pub fn snapshot(&self) -> RuntimeSnapshot {
        let reading = self.power.read();
        RuntimeSnapshot {
            on_battery: reading.on_battery,
            has_active_session: self.state.has_session(),
            accumulated_seconds: self.state.accumulated_seconds,
            total_seconds: self.state.accumulated_seconds,
            session_start_percent: self.state.session_start_percent,
            percentage: reading.percentage,
            estimated_time_to_empty_secs: reading.time_to_empty_secs,
        }
    }

    pub fn state(&self) -> &AccumulatorState {
        &self.state
    }

    pub fn options(&self) -> TrackerOptions {
        self.options
    }

    fn reset_reason(&self, reading: &PowerReading) -> Option<ResetReason> {
        if !reading.on_battery {
            return Some(ResetReason::OnAc);
        }
        match self.state.last_observed_percent {
            Some(last) if reading.percentage > last + self.options.reset_threshold_percent => {
                Some(ResetReason::Recharged {
                    from: last,
                    to: reading.percentage,
                })
            }
            _ => None,
        }
    }

    fn session_ended(&self, reason: ResetReason) {
        let runtime = self.state.accumulated_seconds;
        match reason {
            ResetReason::OnAc => {
                info!(runtime, "session reset: external power");
                self.log
                    .write(&format!("session reset: on AC after {runtime}s"));
            }
            ResetReason::Recharged { from, to } => {
                info!(runtime, from, to, "session reset: percentage jumped");
                self.log.write(&format!(
                    "session reset: percentage rose {from}% -> {to}% after {runtime}s"
                ));
            }
        }
    }

    fn persist(&self) {
        self.store.save(&self.state);
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        let log = &self.log;
        self.listeners.notify(&snapshot, |id, e| {
            warn!(?id, "change listener failed: {e:#}");
            let reason = format!("{e:#}").replace(['\r', '\n'], " ");
            log.write(&format!("onChange error: {reason}"));
        });
    }
}
