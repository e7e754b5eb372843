use brt_core::{AccumulatorState, Result, RuntimeError, StateStore};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::paths::default_state_path;

/// Keeps the accumulator as a single JSON object on disk.
///
/// Writes go to a temporary file next to the target and are renamed over it,
/// so a crash mid-save leaves either the old or the new object, never a torn
/// one.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the per-user cache location.
    pub fn at_default_path() -> Self {
        Self::new(default_state_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state at `path`. A missing file is the empty state; any other
    /// failure is returned.
    pub fn load_from(path: &Path) -> Result<AccumulatorState> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AccumulatorState::default());
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<serde_json::Value>(&raw)? {
            value @ serde_json::Value::Object(_) => Ok(serde_json::from_value(value)?),
            _ => Err(RuntimeError::Persistence(format!(
                "'{}' does not hold a JSON object",
                path.display()
            ))),
        }
    }

    /// Replace whatever is at `path` with `state`, creating parent
    /// directories first.
    pub fn save_to(path: &Path, state: &AccumulatorState) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, state)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| {
            RuntimeError::Persistence(format!("cannot replace '{}': {}", path.display(), e.error))
        })?;
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> AccumulatorState {
        match Self::load_from(&self.path) {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring unreadable state at '{}': {e}", self.path.display());
                AccumulatorState::default()
            }
        }
    }

    fn save(&self, state: &AccumulatorState) {
        match Self::save_to(&self.path, state) {
            Ok(()) => debug!(path = %self.path.display(), "state saved"),
            Err(e) => warn!("Dropping state write to '{}': {e}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AccumulatorState {
        AccumulatorState {
            unplug_timestamp: Some(12_345),
            accumulated_seconds: 3_600,
            last_sample_timestamp: Some(15_945),
            last_observed_percent: Some(57.5),
            session_start_percent: Some(81),
        }
    }

    #[test]
    fn save_then_load_reproduces_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));

        store.save(&sample());
        assert_eq!(store.load(), sample());

        store.save(&AccumulatorState::default());
        assert_eq!(store.load(), AccumulatorState::default());
    }

    #[test]
    fn nulls_are_written_for_absent_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        JsonStateStore::save_to(&path, &AccumulatorState::default()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["unplugMonotonic"].is_null());
        assert!(value["startPercent"].is_null());
        assert_eq!(value["accumulatedRuntime"], 0);
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load(), AccumulatorState::default());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{\"unplugMonotonic\": 12, \"accumul").unwrap();

        assert!(JsonStateStore::load_from(&path).is_err());
        assert_eq!(JsonStateStore::new(&path).load(), AccumulatorState::default());
    }

    #[test]
    fn non_object_json_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        for raw in ["[5000, 86400, 5000, 50, 90]", "[1, 2, 3]", "42", "null", "\"state\""] {
            fs::write(&path, raw).unwrap();
            assert!(
                matches!(JsonStateStore::load_from(&path), Err(RuntimeError::Persistence(_))),
                "{raw}"
            );
            assert_eq!(JsonStateStore::new(&path).load(), AccumulatorState::default(), "{raw}");
        }
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("battery-runtime").join("state.json");
        let store = JsonStateStore::new(&path);

        store.save(&sample());
        assert!(path.exists());
        assert_eq!(store.load(), sample());
    }

    #[test]
    fn save_fully_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, " ".repeat(4096)).unwrap();

        JsonStateStore::save_to(&path, &AccumulatorState::default()).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with('{') && raw.ends_with('}'));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unwritable_target_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory sitting where the file should go makes the rename fail.
        let path = dir.path().join("state.json");
        fs::create_dir(&path).unwrap();

        let store = JsonStateStore::new(&path);
        store.save(&sample());
        assert_eq!(store.load(), AccumulatorState::default());
    }
}
