//! Shared utilities for `errorly`.
//!
//! - ID generation (time-ordered 64-bit snowflakes)
//! - Timestamp formatting for storage
//! - String truncation for outbound messages

pub mod id;
pub mod time;

pub use id::{Id, IdConfig, IdGenerator, IdParts, decode};
pub use time::{format_timestamp, parse_timestamp};

/// Truncate `s` to at most `max_chars` characters, appending `...` when cut.
///
/// Counts characters, not bytes, so multi-byte text is never split.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}
