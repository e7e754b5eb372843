/// Format seconds as a compact panel string: `"1h 23m"` or `"45m"`.
///
/// Partial minutes are dropped; zero (or less than a minute) reads `"0m"`.
pub fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "0m".to_string();
    }
    let mins = secs / 60;
    let h = mins / 60;
    let m = mins % 60;
    if h > 0 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m")
    }
}
