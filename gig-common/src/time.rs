//! Timestamp utilities

use chrono::{DateTime, Local};

/// Format used on the first ledger header line
pub const HEADER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current local timestamp
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Format a timestamp for the ledger header
pub fn header_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format(HEADER_FORMAT).to_string()
}
