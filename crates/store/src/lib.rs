pub mod json;
pub mod log;
pub mod paths;

pub use json::JsonStateStore;
pub use log::FileLog;
pub use paths::{default_log_path, default_state_path};
