use brt_core::DiagnosticLog;
use chrono::{SecondsFormat, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use crate::paths::default_log_path;

const START_BANNER: &str = "==== Battery Runtime started ====";
const STOP_BANNER: &str = "==== Battery Runtime stopped ====";

/// Append-only diagnostic log: one `"<UTC timestamp> <message>"` line per
/// write, flushed immediately.
///
/// A failed open is retried on the next write; a failed write is reported
/// through `tracing` and otherwise ignored.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileLog {
    /// Open (creating if needed) the log at `path` and write the start banner.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = match open_append(&path) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("Cannot open diagnostic log '{}': {e}", path.display());
                None
            }
        };
        let log = Self {
            path,
            file: Mutex::new(file),
        };
        log.write(START_BANNER);
        log
    }

    pub fn open_default() -> Self {
        Self::open(default_log_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the stop banner and release the file handle. Later writes
    /// reopen it.
    pub fn close(&self) {
        self.write(STOP_BANNER);
        self.file.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    fn try_write(&self, message: &str) -> io::Result<()> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(open_append(&self.path)?);
        }
        if let Some(file) = guard.as_mut() {
            let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            writeln!(file, "{ts} {}", one_line(message))?;
            file.flush()?;
        }
        Ok(())
    }
}

impl DiagnosticLog for FileLog {
    fn write(&self, message: &str) {
        if let Err(e) = self.try_write(message) {
            warn!("diagnostic log write failed: {e}");
        }
    }
}

/// Fold line breaks so every message stays on its own log line.
fn one_line(message: &str) -> String {
    message.lines().map(str::trim_end).collect::<Vec<_>>().join(" | ")
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}
