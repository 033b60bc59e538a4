//! Human-readable formatting helpers for listing and result text.

use std::time::SystemTime;

use chrono::{DateTime, Local};

/// Format a byte count as a short human-readable size.
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = size as f64;
    for unit in UNITS {
        if value < 1024.0 {
            if unit == "B" {
                return format!("{} {}", size, unit);
            }
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} PB", value)
}

/// Format a modification timestamp for display in listings.
pub fn format_mtime(time: SystemTime) -> String {
    let dt: DateTime<Local> = time.into();
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Current local timestamp for the startup log line.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
