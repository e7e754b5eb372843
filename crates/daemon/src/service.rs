use brt_core::{PowerEvent, PowerTracker};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Interval between runtime accumulation ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// The tracker's event loop, running as one task.
///
/// Power notifications and timer ticks are handled strictly one at a time,
/// in the order the loop receives them.
pub struct TrackerService {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<PowerTracker>,
}

impl TrackerService {
    /// Start `tracker` (which performs the initial evaluation right away) and
    /// spawn the loop feeding it `events` and a tick every `tick`.
    pub fn start(
        mut tracker: PowerTracker,
        events: mpsc::Receiver<PowerEvent>,
        tick: Duration,
    ) -> Self {
        tracker.start();

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            run(&mut tracker, events, tick, shutdown_rx).await;
            tracker.stop();
            tracker
        });

        Self { shutdown, task }
    }

    /// Stop ticking and accepting events, then hand the stopped tracker back.
    /// Events still queued are dropped.
    pub async fn stop(self) -> Result<PowerTracker, JoinError> {
        let _ = self.shutdown.send(true);
        self.task.await
    }
}

async fn run(
    tracker: &mut PowerTracker,
    mut events: mpsc::Receiver<PowerEvent>,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut events_open = true;

    loop {
        tokio::select! {
            biased;

            // Also fires if the service handle was dropped without `stop`.
            _ = shutdown.changed() => break,

            event = events.recv(), if events_open => match event {
                Some(event) => tracker.handle_event(event),
                None => {
                    debug!("all power event sources closed; ticking only");
                    events_open = false;
                }
            },

            _ = ticker.tick() => tracker.tick(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brt_core::testing::{FakePower, MemoryLog, MemoryStore};
    use brt_core::{Clock, MonotonicSecs, TrackerDeps, TrackerOptions};

    /// Monotonic seconds driven by tokio's (paused) clock.
    struct TokioClock(Instant);

    impl Clock for TokioClock {
        fn now(&self) -> MonotonicSecs {
            1_000 + self.0.elapsed().as_secs()
        }
    }

    struct Rig {
        power: FakePower,
        store: MemoryStore,
        log: MemoryLog,
    }

    impl Rig {
        fn new(on_battery: bool, percent: f64) -> Self {
            Self {
                power: FakePower::new(on_battery, percent),
                store: MemoryStore::default(),
                log: MemoryLog::default(),
            }
        }

        fn start(&self) -> (TrackerService, mpsc::Sender<PowerEvent>) {
            let tracker = PowerTracker::new(
                TrackerDeps {
                    power: Box::new(self.power.clone()),
                    clock: Box::new(TokioClock(Instant::now())),
                    store: Box::new(self.store.clone()),
                    log: Box::new(self.log.clone()),
                },
                TrackerOptions::default(),
            );
            let (tx, rx) = mpsc::channel(8);
            (TrackerService::start(tracker, rx, TICK_INTERVAL), tx)
        }

        fn accumulated(&self) -> u64 {
            self.store.saved().map_or(0, |s| s.accumulated_seconds)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_accumulate_until_plugged_in() {
        let rig = Rig::new(true, 80.0);
        let (service, tx) = rig.start();
        assert_eq!(rig.store.saved().unwrap().session_start_percent, Some(80));

        time::sleep(Duration::from_secs(181)).await;
        assert_eq!(rig.accumulated(), 180);

        rig.power.set(false, 80.0);
        tx.send(PowerEvent::StateChanged).await.unwrap();
        time::sleep(Duration::from_secs(1)).await;

        let saved = rig.store.saved().unwrap();
        assert_eq!(saved.accumulated_seconds, 0);
        assert_eq!(saved.unplug_timestamp, None);

        let tracker = service.stop().await.unwrap();
        assert!(!tracker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn percent_jump_resets_through_event_loop() {
        let rig = Rig::new(true, 50.0);
        let (service, tx) = rig.start();

        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(rig.accumulated(), 60);

        rig.power.set(true, 55.0);
        tx.send(PowerEvent::StateChanged).await.unwrap();
        time::sleep(Duration::from_secs(1)).await;

        let saved = rig.store.saved().unwrap();
        assert_eq!(saved.accumulated_seconds, 0);
        assert_eq!(saved.session_start_percent, Some(55));
        assert!(saved.unplug_timestamp.is_some());

        service.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_ticks_and_persistence() {
        let rig = Rig::new(true, 70.0);
        let (service, _tx) = rig.start();
        time::sleep(Duration::from_secs(61)).await;

        let tracker = service.stop().await.unwrap();
        let saves = rig.store.save_count();
        time::sleep(Duration::from_secs(600)).await;

        assert_eq!(rig.store.save_count(), saves);
        assert_eq!(tracker.state().accumulated_seconds, 60);
        assert!(rig.log.contains("PowerTracker stopped"));
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_ticking_after_sources_close() {
        let rig = Rig::new(true, 70.0);
        let (service, tx) = rig.start();
        drop(tx);

        time::sleep(Duration::from_secs(121)).await;
        assert_eq!(rig.accumulated(), 120);
        service.stop().await.unwrap();
    }
}
