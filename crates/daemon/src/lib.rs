//! Runtime wiring for `battery-runtime`.
//!
//! Owns the tracker's event loop and connects it to its collaborators:
//! - sysfs battery reader (state, percentage, time-to-empty)
//! - UPower D-Bus signals and/or sysfs polling (change notifications)
//! - 60-second timer (runtime accumulation)
//! - JSON state file and append-only diagnostic log
//! - stdout panel output

pub mod output;
pub mod service;
pub mod sources;

pub use output::PanelOutput;
pub use service::{TrackerService, TICK_INTERVAL};
pub use sources::spawn_sources;

use brt_config::{Config, OutputMode};
use brt_core::{PowerTracker, TrackerDeps, TrackerOptions};
use brt_store::{FileLog, JsonStateStore};
use brt_system::{MonotonicClock, SysfsPower};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capacity of the power-event queue between sources and the tracker.
const EVENT_QUEUE: usize = 16;

/// Run the tracker until SIGINT/SIGTERM.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let log = Arc::new(match &config.log_path {
        Some(path) => FileLog::open(path.clone()),
        None => FileLog::open_default(),
    });
    let store = match &config.state_path {
        Some(path) => JsonStateStore::new(path.clone()),
        None => JsonStateStore::at_default_path(),
    };
    info!("State file: {}", store.path().display());
    info!("Diagnostic log: {}", log.path().display());

    let power = SysfsPower::new(config.battery.clone());
    let mut tracker = PowerTracker::new(
        TrackerDeps {
            power: Box::new(power.clone()),
            clock: Box::new(MonotonicClock),
            store: Box::new(store),
            log: Box::new(Arc::clone(&log)),
        },
        TrackerOptions {
            reset_threshold_percent: config.reset_threshold_percent,
        },
    );
    if config.output != OutputMode::Quiet {
        tracker.subscribe(PanelOutput::stdout(config.output));
    }

    let (tx, rx) = mpsc::channel(EVENT_QUEUE);
    let sources = spawn_sources(&config, power, tx);
    let service = TrackerService::start(tracker, rx, config.tick_interval());

    shutdown_signal().await;
    info!("Shutting down");

    let tracker = service.stop().await?;
    for task in sources {
        task.abort();
    }
    info!(
        accumulated = tracker.state().accumulated_seconds,
        session = tracker.state().has_session(),
        "final state"
    );
    log.close();
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
