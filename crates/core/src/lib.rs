//! Battery discharge-session tracking: the accumulator, its state machine and
//! the collaborator traits the rest of the workspace implements.

pub mod error;
pub mod event;
mod listener;
pub mod source;
pub mod state;
pub mod tracker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Result, RuntimeError};
pub use event::PowerEvent;
pub use listener::{ChangeListener, ListenerId};
pub use source::{Clock, DiagnosticLog, NullLog, PowerSource, StateStore};
pub use state::{AccumulatorState, MonotonicSecs, PowerReading, RuntimeSnapshot};
pub use tracker::{PowerTracker, TrackerDeps, TrackerOptions, DEFAULT_RESET_THRESHOLD};
