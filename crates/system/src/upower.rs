use brt_core::PowerEvent;
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::mpsc::Sender;
use tracing::info;
use zbus::zvariant::OwnedValue;
use zbus::{Connection, MatchRule, MessageStream};

/// UPower's aggregate "display device", the battery the desktop shows.
pub const DISPLAY_DEVICE: &str = "/org/freedesktop/UPower/devices/DisplayDevice";
const DEVICE_IFACE: &str = "org.freedesktop.UPower.Device";

/// Forward UPower `PropertiesChanged` signals for the display device as
/// [`PowerEvent`]s until `tx` is closed.
///
/// Returns an error straight away if the system bus or the match rule is
/// unavailable, and also if the signal stream ends while `tx` is still open
/// (bus connection lost), so the caller can fall back to polling. `Ok` means
/// `tx` was closed.
pub async fn run_upower(tx: Sender<PowerEvent>) -> zbus::Result<()> {
    let conn = Connection::system().await?;

    let rule = MatchRule::builder()
        .msg_type(zbus::message::Type::Signal)
        .interface("org.freedesktop.DBus.Properties")?
        .member("PropertiesChanged")?
        .path(DISPLAY_DEVICE)?
        .build();

    let mut stream = MessageStream::for_match_rule(rule, &conn, None).await?;
    info!("Listening for UPower changes on {DISPLAY_DEVICE}");

    loop {
        let msg = tokio::select! {
            _ = tx.closed() => break,
            msg = stream.next() => msg,
        };
        let Some(msg) = msg else {
            return Err(zbus::Error::Failure("UPower signal stream ended".into()));
        };
        let Ok(msg) = msg else { continue };

        let body = msg.body();
        let parsed: (String, HashMap<String, OwnedValue>, Vec<String>) = match body.deserialize() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let (iface, changed, _invalidated) = parsed;
        if iface != DEVICE_IFACE {
            continue;
        }

        if let Some(event) = classify_properties(changed.keys().map(String::as_str)) {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    }

    Ok(())
}

/// Map the names of changed device properties to the event they imply.
/// Charge state or level wins over a bare estimate update.
pub fn classify_properties<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<PowerEvent> {
    let mut event = None;
    for name in names {
        match name {
            "State" | "Percentage" | "IsPresent" => return Some(PowerEvent::StateChanged),
            "TimeToEmpty" => event = Some(PowerEvent::EstimateChanged),
            _ => {}
        }
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_change_beats_estimate() {
        assert_eq!(
            classify_properties(["TimeToEmpty", "Percentage"]),
            Some(PowerEvent::StateChanged)
        );
    }

    #[test]
    fn estimate_only() {
        assert_eq!(
            classify_properties(["TimeToEmpty", "EnergyRate"]),
            Some(PowerEvent::EstimateChanged)
        );
    }

    #[test]
    fn unrelated_properties_are_ignored() {
        assert_eq!(classify_properties(["Energy", "UpdateTime"]), None);
    }
}
