//! Error types for data parsing in btmanager-types.

use thiserror::Error;

/// Errors that can occur when parsing device data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The timestamp does not match the `created_at` format.
    #[error("Invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: time::error::Parse,
    },

    /// A display format description could not be parsed.
    #[error("Invalid format description: {0}")]
    InvalidFormat(#[from] time::error::InvalidFormatDescription),
}

/// Result type alias using btmanager-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
