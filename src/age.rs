//! Compact "time since" labels for feed rows.

use chrono::{DateTime, Utc};

/// Format an elapsed number of seconds as `Ns`, `Mm Ns` or `Hh Mm Ns`.
///
/// Negative values (a post stamped slightly in the future by clock skew)
/// are shown as `0s`.
pub fn format_age(elapsed_secs: i64) -> String {
    let secs = elapsed_secs.max(0);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if secs >= 3600 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if secs >= 60 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Whole seconds between `created_at` and `now`.
pub fn elapsed_secs(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.timestamp() - created_at.timestamp()
}
