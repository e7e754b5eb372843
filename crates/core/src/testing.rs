//! In-memory stand-ins for every tracker collaborator.
//!
//! Each fake is a cheap `Clone` over shared state, so a test keeps one copy to
//! steer (or inspect) while the tracker owns the other.

use crate::source::{Clock, DiagnosticLog, PowerSource, StateStore};
use crate::state::{AccumulatorState, MonotonicSecs, PowerReading};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scriptable battery.
#[derive(Debug, Clone, Default)]
pub struct FakePower(Arc<Mutex<PowerReading>>);

impl FakePower {
    pub fn new(on_battery: bool, percentage: f64) -> Self {
        Self(Arc::new(Mutex::new(PowerReading {
            on_battery,
            percentage,
            time_to_empty_secs: 0,
        })))
    }

    pub fn set(&self, on_battery: bool, percentage: f64) {
        let mut r = lock(&self.0);
        r.on_battery = on_battery;
        r.percentage = percentage;
    }

    pub fn set_time_to_empty(&self, secs: u64) {
        lock(&self.0).time_to_empty_secs = secs;
    }
}

impl PowerSource for FakePower {
    fn read(&self) -> PowerReading {
        *lock(&self.0)
    }
}

/// Manually advanced monotonic clock.
#[derive(Debug, Clone, Default)]
pub struct FakeClock(Arc<AtomicU64>);

impl FakeClock {
    pub fn new(start: MonotonicSecs) -> Self {
        Self(Arc::new(AtomicU64::new(start)))
    }

    pub fn set(&self, now: MonotonicSecs) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> MonotonicSecs {
        self.0.load(Ordering::SeqCst)
    }
}

/// Keeps the last saved state in memory and counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Option<AccumulatorState>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// A store that already holds `state`, as if written by a previous run.
    pub fn seeded(state: AccumulatorState) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(state))),
            saves: Arc::default(),
        }
    }

    pub fn saved(&self) -> Option<AccumulatorState> {
        lock(&self.state).clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> AccumulatorState {
        lock(&self.state).clone().unwrap_or_default()
    }

    fn save(&self, state: &AccumulatorState) {
        *lock(&self.state) = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
    }
}

/// Collects diagnostic lines.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog(Arc<Mutex<Vec<String>>>);

impl MemoryLog {
    pub fn lines(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        lock(&self.0).iter().any(|l| l.contains(needle))
    }
}

impl DiagnosticLog for MemoryLog {
    fn write(&self, message: &str) {
        lock(&self.0).push(message.to_string());
    }
}
