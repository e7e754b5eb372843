pub mod format;
pub mod view;

pub use format::format_duration;
pub use view::{IndicatorView, WaybarLine, ON_AC_ICON, ON_BATTERY_ICON};
