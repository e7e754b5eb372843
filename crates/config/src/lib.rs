pub mod schema;

pub use schema::{Backend, Config, OutputMode};

use brt_core::{Result, RuntimeError};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `Config::default()` if the
/// file doesn't exist so the tracker always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| RuntimeError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: Config =
        toml::from_str(&raw).map_err(|e| RuntimeError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("battery-runtime").join("config.toml")
}
