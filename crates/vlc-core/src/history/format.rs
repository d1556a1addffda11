//! Log line format
//!
//! `[HH:MM:SS] [<direction>]: <payload>`, one line per entry.

use super::HistoryEntry;

/// Stand-in written for NUL bytes so the log stays plain text
pub const NUL_PLACEHOLDER: &str = "<NUL>";

/// Render `entry` as a log line, without the trailing newline
pub fn format_line(entry: &HistoryEntry) -> String {
    format!(
        "[{}] [{}]: {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.direction.label(),
        entry.payload.replace('\0', NUL_PLACEHOLDER)
    )
}
