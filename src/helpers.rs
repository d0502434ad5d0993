//! Small helpers shared by the listing, the adapter and the front-end.

use chrono::{DateTime, Local, Utc};
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Display format for modification dates.
pub const MODIFIED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Returns a user-safe, trimmed path string that can be used in logs and messages.
pub fn sanitize_user_path(path: &Path) -> String {
    path.display().to_string().trim().to_string()
}

/// True when the file name starts with a dot.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// True when `path` carries one of `extensions`, compared case-insensitively.
pub fn has_comic_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Converts a filesystem timestamp into UTC.
pub fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Renders a modification date in local time.
pub fn format_modified(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format(MODIFIED_TIME_FORMAT).to_string()
}

/// Human readable size rendering.
pub fn print_size(bytes: u64) -> String {
    const SUFFIXES: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut value = bytes as f64;
    let mut idx = 0usize;

    while value >= 1024.0 && idx < SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }

    if idx == 0 {
        format!("{:.0} {}", value, SUFFIXES[idx])
    } else {
        format!("{:.1} {}", value, SUFFIXES[idx])
    }
}

/// Short rendering of a grace period, e.g. `4s` or `1500ms`.
pub fn format_grace_period(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}
