//! The fixed `created_at` timestamp format.
//!
//! Records carry their creation time as a string such as
//! `2018-11-06T16:16:05.042z`. The hour is on the 24-hour clock and the
//! fraction is always three digits, so lexical order of two stamps is
//! also chronological order. Parsing is lenient about the number of
//! fraction digits to accept stamps written by older clients.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::warn;

use crate::error::{ParseError, ParseResult};

/// Format used when writing `created_at`.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]z");

const PARSE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]z");

/// Format a point in time as a `created_at` string.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.format(TIMESTAMP_FORMAT)
}

/// The current UTC time as a `created_at` string.
///
/// Returns an empty string if formatting fails. Callers must tolerate an
/// empty `created_at`.
pub fn current_timestamp() -> String {
    match format_timestamp(OffsetDateTime::now_utc()) {
        Ok(stamp) => stamp,
        Err(e) => {
            warn!(error = %e, "Failed to format current timestamp");
            String::new()
        }
    }
}

/// Parse a `created_at` string.
pub fn parse_timestamp(value: &str) -> ParseResult<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value, PARSE_FORMAT).map_err(|source| ParseError::InvalidTimestamp {
        value: value.to_string(),
        source,
    })
}

/// Reformat a stored `created_at` for display.
///
/// `format` uses the `time` crate's format description syntax, e.g.
/// `"[day]/[month]/[year] [hour]:[minute]"`. If either the stamp or the
/// format cannot be parsed, `raw` is returned unchanged.
pub fn display_timestamp(raw: &str, format: &str) -> String {
    let items = match time::format_description::parse(format) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, format, "Invalid display format");
            return raw.to_string();
        }
    };

    parse_timestamp(raw)
        .ok()
        .and_then(|at| at.format(items.as_slice()).ok())
        .unwrap_or_else(|| raw.to_string())
}
