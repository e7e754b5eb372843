pub mod battery;
pub mod clock;
pub mod upower;

pub use battery::SysfsPower;
pub use clock::MonotonicClock;
pub use upower::run_upower;

use brt_core::{PowerEvent, PowerReading, PowerSource};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// Poll `source` every `interval` and forward a [`PowerEvent`] whenever the
/// reading differs from the previous one, starting from `initial`.
///
/// The first comparison happens one interval after the call. Returns once `tx`
/// is closed.
pub async fn run_poller<S: PowerSource>(
    source: S,
    initial: PowerReading,
    interval: Duration,
    tx: mpsc::Sender<PowerEvent>,
) {
    let mut last = initial;
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tx.closed() => break,
        }

        let current = source.read();
        if let Some(event) = diff(&last, &current) {
            if tx.send(event).await.is_err() {
                break; // all receivers dropped
            }
        }
        last = current;
    }
}

/// Spawn [`run_poller`] on the current runtime. The baseline reading is taken
/// here, before the task first runs, so no change after this call is missed.
pub fn spawn_poller<S>(
    source: S,
    interval: Duration,
    tx: mpsc::Sender<PowerEvent>,
) -> tokio::task::JoinHandle<()>
where
    S: PowerSource + 'static,
{
    let initial = source.read();
    tokio::spawn(run_poller(source, initial, interval, tx))
}

fn diff(prev: &PowerReading, next: &PowerReading) -> Option<PowerEvent> {
    if prev.on_battery != next.on_battery || prev.percentage != next.percentage {
        Some(PowerEvent::StateChanged)
    } else if prev.time_to_empty_secs != next.time_to_empty_secs {
        Some(PowerEvent::EstimateChanged)
    } else {
        None
    }
}
