/// Notifications delivered to the tracker's event loop.
///
/// Sources:
/// - sysfs poller          → `StateChanged`, `EstimateChanged`
/// - UPower D-Bus listener → `StateChanged`, `EstimateChanged`
///
/// The 60-second tick is not an event; the daemon drives it from its own
/// interval timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    /// Charge state or percentage changed; re-evaluate the session.
    StateChanged,
    /// Only the estimated time-to-empty moved; refresh listeners, keep state.
    EstimateChanged,
}
