//! Error types for btmanager-core.
//!
//! Remote failures never appear in the repository's return
//! values: a failed push or fetch degrades to local data and is only
//! logged. The errors below are what can still reach a caller.
//!
//! | Error | Typical cause | Caller action |
//! |-------|---------------|---------------|
//! | [`Error::Store`] | SQLite failure, poisoned lock | Report, local data unavailable |
//! | [`Error::Remote`] | Direct use of [`HttpDeviceClient`](crate::HttpDeviceClient) | Retry later if transient |
//! | [`Error::RadioUnavailable`] | No adapter, feature disabled | Ask the user to enable Bluetooth |
//! | [`Error::WorkerStopped`] | Worker task shut down | Recreate the worker |

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors that can occur in the synchronization core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Local persistence failed.
    #[error("Store error: {0}")]
    Store(#[from] btmanager_store::Error),

    /// Remote backend failed.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// No usable Bluetooth radio.
    #[error("Bluetooth radio unavailable: {0}")]
    RadioUnavailable(String),

    /// Bluetooth stack error.
    #[cfg(feature = "ble")]
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// The repository worker is no longer running.
    #[error("Repository worker stopped")]
    WorkerStopped,
}

impl Error {
    /// Create a radio unavailable error.
    pub fn radio_unavailable(reason: impl Into<String>) -> Self {
        Self::RadioUnavailable(reason.into())
    }
}

/// Result type alias using btmanager-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::radio_unavailable("adapter powered off");
        assert_eq!(
            err.to_string(),
            "Bluetooth radio unavailable: adapter powered off"
        );

        let err = Error::WorkerStopped;
        assert_eq!(err.to_string(), "Repository worker stopped");

        let err = Error::from(RemoteError::Api {
            status: 503,
            message: "maintenance".to_string(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn test_store_error_conversion() {
        let err: Error = btmanager_store::Error::Poisoned.into();
        assert!(matches!(err, Error::Store(_)));
    }
}
