use crate::state::{AccumulatorState, MonotonicSecs, PowerReading};
use std::sync::Arc;

/// The power subsystem as the tracker sees it: a synchronous, always-answering
/// query. Adapters that can fail report "not on battery" instead.
pub trait PowerSource: Send {
    fn read(&self) -> PowerReading;
}

/// Boot-relative monotonic time in whole seconds.
pub trait Clock: Send {
    fn now(&self) -> MonotonicSecs;
}

/// Durable home of the accumulator.
///
/// Both methods are fail-soft: `load` falls back to the default state and
/// `save` drops the write. Implementations log what they swallow.
pub trait StateStore: Send {
    fn load(&self) -> AccumulatorState;
    fn save(&self, state: &AccumulatorState);
}

/// Append-only, single-line diagnostic sink. Must never panic.
pub trait DiagnosticLog: Send {
    fn write(&self, message: &str);
}

/// Lets the owner keep a handle (e.g. to close the file) while the tracker
/// writes through another.
impl<T: DiagnosticLog + Sync + ?Sized> DiagnosticLog for Arc<T> {
    fn write(&self, message: &str) {
        (**self).write(message);
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl DiagnosticLog for NullLog {
    fn write(&self, _message: &str) {}
}
