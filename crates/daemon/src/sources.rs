use brt_config::{Backend, Config};
use brt_core::{PowerEvent, PowerSource};
use brt_system::{run_poller, run_upower, spawn_poller, SysfsPower};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Start whatever produces power-change notifications for `config.backend`.
///
/// Every task ends on its own once the receiving side of `tx` is dropped.
pub fn spawn_sources(
    config: &Config,
    power: SysfsPower,
    tx: Sender<PowerEvent>,
) -> Vec<JoinHandle<()>> {
    let interval = config.poll_interval();

    let task = match config.backend {
        Backend::Sysfs => {
            info!("Polling sysfs every {}s", interval.as_secs());
            spawn_poller(power, interval, tx)
        }
        Backend::Upower => tokio::spawn(async move {
            if let Err(e) = run_upower(tx).await {
                error!("UPower unavailable and polling disabled: {e}");
            }
        }),
        Backend::Auto => {
            let upower = run_upower(tx.clone());
            tokio::spawn(upower_or_poll(upower, power, interval, tx))
        }
    };

    vec![task]
}

/// Drive `upower` and switch to polling `power` if it ever gives up while the
/// tracker is still listening.
async fn upower_or_poll<F, E, S>(upower: F, power: S, interval: Duration, tx: Sender<PowerEvent>)
where
    F: Future<Output = Result<(), E>>,
    E: Display,
    S: PowerSource,
{
    let outcome = upower.await;
    if tx.is_closed() {
        return;
    }
    match outcome {
        Err(e) => warn!("UPower unavailable ({e}); polling sysfs every {}s", interval.as_secs()),
        Ok(()) => warn!("UPower stopped; polling sysfs every {}s", interval.as_secs()),
    }

    // Changes may have gone unreported while UPower was down.
    let initial = power.read();
    if tx.send(PowerEvent::StateChanged).await.is_err() {
        return;
    }
    run_poller(power, initial, interval, tx).await;
}
