use brt_core::{PowerReading, PowerSource, Result, RuntimeError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SYSFS_POWER_SUPPLY: &str = "/sys/class/power_supply";

/// Read battery state from the Linux sysfs power-supply interface.
///
/// "On battery" means the supply reports `Discharging`; `Charging`, `Full`,
/// `Not charging` and `Unknown` all count as external power.
#[derive(Debug, Clone)]
pub struct SysfsPower {
    root: PathBuf,
    battery: Option<String>,
}

impl SysfsPower {
    /// `battery` pins a supply name such as `"BAT1"`; `None` picks the first
    /// `BAT*` entry.
    pub fn new(battery: Option<String>) -> Self {
        Self::with_root(SYSFS_POWER_SUPPLY, battery)
    }

    pub fn with_root(root: impl Into<PathBuf>, battery: Option<String>) -> Self {
        Self {
            root: root.into(),
            battery,
        }
    }

    /// Returns `Ok(None)` if the system has no battery (desktop, VM).
    pub fn read_battery(&self) -> Result<Option<PowerReading>> {
        let Some(base) = self.battery_dir() else {
            return Ok(None);
        };

        let status = read_trimmed(&base.join("status"))?;
        let on_battery = status == "Discharging";
        let percentage = capacity(&base)?;
        let time_to_empty_secs = if on_battery {
            time_to_empty(&base).unwrap_or(0)
        } else {
            0
        };

        Ok(Some(PowerReading {
            on_battery,
            percentage,
            time_to_empty_secs,
        }))
    }

    fn battery_dir(&self) -> Option<PathBuf> {
        if let Some(name) = &self.battery {
            let dir = self.root.join(name);
            return dir.is_dir().then_some(dir);
        }

        let mut names: Vec<String> = fs::read_dir(&self.root)
            .ok()?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("BAT"))
            .collect();
        names.sort();
        names.first().map(|n| self.root.join(n))
    }
}

impl PowerSource for SysfsPower {
    fn read(&self) -> PowerReading {
        match self.read_battery() {
            Ok(Some(reading)) => reading,
            Ok(None) => PowerReading::default(),
            Err(e) => {
                debug!("battery read failed, assuming external power: {e}");
                PowerReading::default()
            }
        }
    }
}

/// `capacity` when present, otherwise derived from `energy_*` / `charge_*`.
fn capacity(base: &Path) -> Result<f64> {
    if let Ok(raw) = read_trimmed(&base.join("capacity")) {
        return raw
            .parse::<f64>()
            .map_err(|e| RuntimeError::Power(format!("bad capacity '{raw}': {e}")));
    }

    let ratio = |now: &str, full: &str| -> Option<f64> {
        let now = read_u64(&base.join(now))?;
        let full = read_u64(&base.join(full))?;
        (full > 0).then(|| (now as f64 / full as f64 * 100.0).clamp(0.0, 100.0))
    };
    ratio("energy_now", "energy_full")
        .or_else(|| ratio("charge_now", "charge_full"))
        .ok_or_else(|| RuntimeError::Power(format!("no capacity under '{}'", base.display())))
}

/// Seconds until empty at the present draw: `energy_now / power_now`
/// (µWh / µW) or `charge_now / current_now` (µAh / µA).
fn time_to_empty(base: &Path) -> Option<u64> {
    let pair = |now: &str, rate: &str| {
        Some((read_u64(&base.join(now))?, read_u64(&base.join(rate))?))
    };
    let (now, rate) = pair("energy_now", "power_now")
        .or_else(|| pair("charge_now", "current_now"))?;
    if rate == 0 {
        return None;
    }
    Some(now.saturating_mul(3600) / rate)
}

fn read_trimmed(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

fn read_u64(path: &Path) -> Option<u64> {
    read_trimmed(path).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supply(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, value) in files {
            fs::write(dir.join(file), format!("{value}\n")).unwrap();
        }
    }

    #[test]
    fn discharging_battery_with_energy_estimate() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "AC", &[("online", "0")]);
        supply(
            root.path(),
            "BAT0",
            &[
                ("status", "Discharging"),
                ("capacity", "64"),
                ("energy_now", "30000000"),
                ("power_now", "10000000"),
            ],
        );

        let r = SysfsPower::with_root(root.path(), None).read();
        assert!(r.on_battery);
        assert_eq!(r.percentage, 64.0);
        assert_eq!(r.time_to_empty_secs, 3 * 3600);
    }

    #[test]
    fn charge_based_estimate_and_derived_capacity() {
        let root = tempfile::tempdir().unwrap();
        supply(
            root.path(),
            "BAT1",
            &[
                ("status", "Discharging"),
                ("charge_now", "2000000"),
                ("charge_full", "4000000"),
                ("current_now", "1000000"),
            ],
        );

        let r = SysfsPower::with_root(root.path(), Some("BAT1".into())).read();
        assert_eq!(r.percentage, 50.0);
        assert_eq!(r.time_to_empty_secs, 7200);
    }

    #[test]
    fn charging_and_not_charging_are_external_power() {
        for status in ["Charging", "Full", "Not charging", "Unknown"] {
            let root = tempfile::tempdir().unwrap();
            supply(
                root.path(),
                "BAT0",
                &[("status", status), ("capacity", "99"), ("power_now", "5")],
            );
            let r = SysfsPower::with_root(root.path(), None).read();
            assert!(!r.on_battery, "{status}");
            assert_eq!(r.time_to_empty_secs, 0);
        }
    }

    #[test]
    fn zero_draw_gives_unknown_estimate() {
        let root = tempfile::tempdir().unwrap();
        supply(
            root.path(),
            "BAT0",
            &[
                ("status", "Discharging"),
                ("capacity", "40"),
                ("energy_now", "1"),
                ("power_now", "0"),
            ],
        );
        assert_eq!(SysfsPower::with_root(root.path(), None).read().time_to_empty_secs, 0);
    }

    #[test]
    fn no_battery_reads_as_ac() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "AC", &[("online", "1")]);
        let power = SysfsPower::with_root(root.path(), None);
        assert!(power.read_battery().unwrap().is_none());
        assert_eq!(power.read(), PowerReading::default());
    }

    #[test]
    fn garbage_capacity_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "BAT0", &[("status", "Discharging"), ("capacity", "lots")]);
        let power = SysfsPower::with_root(root.path(), None);
        assert!(power.read_battery().is_err());
        assert!(!power.read().on_battery);
    }
}
