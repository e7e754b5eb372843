use std::path::PathBuf;

const APP_DIR: &str = "battery-runtime";

/// `$XDG_CACHE_HOME/battery-runtime/state.json`, or `~/.cache/...`.
pub fn default_state_path() -> PathBuf {
    xdg_dir("XDG_CACHE_HOME", ".cache")
        .join(APP_DIR)
        .join("state.json")
}

/// `$XDG_DATA_HOME/battery-runtime.log`, or `~/.local/share/...`.
pub fn default_log_path() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share").join(format!("{APP_DIR}.log"))
}

fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(fallback)
        })
}
