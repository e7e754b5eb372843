use brt_core::RuntimeSnapshot;
use serde::Serialize;

use crate::format::format_duration;

pub const ON_BATTERY_ICON: &str = "clock-alt-symbolic";
pub const ON_AC_ICON: &str = "gnome-power-manager-symbolic";

const TITLE: &str = "Battery Runtime";
const DASH: &str = "–";

/// Everything a panel needs to draw the indicator: icon, label and the popup
/// lines under the "Battery Runtime" header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorView {
    pub icon_name: &'static str,
    pub label: String,
    pub since_unplugged: String,
    pub active_time: String,
    pub started_at: String,
    pub estimated_remaining: String,
    /// `true` while a discharge session is shown.
    pub discharging: bool,
}

impl IndicatorView {
    pub fn from_snapshot(s: &RuntimeSnapshot) -> Self {
        let remaining = if s.estimated_time_to_empty_secs > 0 {
            format_duration(s.estimated_time_to_empty_secs)
        } else {
            DASH.to_string()
        };
        let estimated_remaining = format!("Estimated remaining: {remaining}");

        if s.on_battery && s.has_active_session {
            let total = format_duration(s.total_seconds);
            let started = s
                .session_start_percent
                .map_or_else(|| DASH.to_string(), |p| format!("{p}%"));
            Self {
                icon_name: ON_BATTERY_ICON,
                since_unplugged: format!("Since unplugged: {total}"),
                active_time: format!("Active time: {}", format_duration(s.accumulated_seconds)),
                started_at: format!("Started at: {started}"),
                label: total,
                estimated_remaining,
                discharging: true,
            }
        } else {
            Self {
                icon_name: ON_AC_ICON,
                label: "AC".to_string(),
                since_unplugged: format!("Since unplugged: {DASH}"),
                active_time: format!("Active time: {DASH}"),
                started_at: format!("Started at: {DASH}"),
                estimated_remaining,
                discharging: false,
            }
        }
    }

    /// Popup body, header first.
    pub fn lines(&self) -> [&str; 5] {
        [
            TITLE,
            &self.since_unplugged,
            &self.active_time,
            &self.started_at,
            &self.estimated_remaining,
        ]
    }

    pub fn tooltip(&self) -> String {
        self.lines().join("\n")
    }

    pub fn waybar(&self) -> WaybarLine<'_> {
        let class = if self.discharging { "battery" } else { "ac" };
        WaybarLine {
            text: &self.label,
            tooltip: self.tooltip(),
            class,
            alt: class,
        }
    }
}

/// One line of waybar `custom` module output.
#[derive(Debug, Serialize)]
pub struct WaybarLine<'a> {
    pub text: &'a str,
    pub tooltip: String,
    pub class: &'static str,
    pub alt: &'static str,
}

impl WaybarLine<'_> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discharging() -> RuntimeSnapshot {
        RuntimeSnapshot {
            on_battery: true,
            has_active_session: true,
            accumulated_seconds: 4_980,
            total_seconds: 4_980,
            session_start_percent: Some(80),
            percentage: 61.0,
            estimated_time_to_empty_secs: 2 * 3600 + 15 * 60,
        }
    }

    #[test]
    fn session_view() {
        let v = IndicatorView::from_snapshot(&discharging());
        assert_eq!(v.icon_name, ON_BATTERY_ICON);
        assert_eq!(v.label, "1h 23m");
        assert_eq!(v.since_unplugged, "Since unplugged: 1h 23m");
        assert_eq!(v.active_time, "Active time: 1h 23m");
        assert_eq!(v.started_at, "Started at: 80%");
        assert_eq!(v.estimated_remaining, "Estimated remaining: 2h 15m");
    }

    #[test]
    fn ac_view_still_shows_estimate_when_known() {
        let snap = RuntimeSnapshot {
            estimated_time_to_empty_secs: 600,
            ..RuntimeSnapshot::default()
        };
        let v = IndicatorView::from_snapshot(&snap);
        assert_eq!(v.icon_name, ON_AC_ICON);
        assert_eq!(v.label, "AC");
        assert_eq!(v.started_at, "Started at: –");
        assert_eq!(v.estimated_remaining, "Estimated remaining: 10m");
    }

    #[test]
    fn on_battery_without_session_is_ac_view() {
        let snap = RuntimeSnapshot {
            has_active_session: false,
            ..discharging()
        };
        assert_eq!(IndicatorView::from_snapshot(&snap).label, "AC");
    }

    #[test]
    fn waybar_json_shape() {
        let v = IndicatorView::from_snapshot(&discharging());
        let json: serde_json::Value = serde_json::from_str(&v.waybar().to_json().unwrap()).unwrap();
        assert_eq!(json["text"], "1h 23m");
        assert_eq!(json["class"], "battery");
        assert!(json["tooltip"].as_str().unwrap().starts_with("Battery Runtime\n"));
    }
}
