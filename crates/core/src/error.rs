use thiserror::Error;

/// Top-level error type shared by every crate in the workspace.
///
/// Nothing in the tracker itself is allowed to fail on these: persistence and
/// power-reading errors are recovered where they happen and only surface here
/// so the adapters can report them with context.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("power subsystem error: {0}")]
    Power(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
