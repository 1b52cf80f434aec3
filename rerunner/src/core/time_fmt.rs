//! Human-readable wall-clock durations for per-process log lines.

use std::time::Duration;

/// Format a duration as `m:ss`, rounding to the nearest second. A
/// fractional part that rounds up to a full minute carries over (`2:60`
/// becomes `3:00`).
pub fn format_mm_ss(duration: Duration) -> String {
    let millis = duration.as_millis();
    let minutes = millis / 60_000;
    let seconds = ((millis % 60_000) as f64 / 1000.0).round() as u64;
    if seconds == 60 {
        format!("{}:00", minutes + 1)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
