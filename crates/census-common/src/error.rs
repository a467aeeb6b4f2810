//! Error types for Census.
//!
//! Transmission failures are deliberately *not* represented here: one upload
//! attempt always produces a `SubmissionOutcome` (census-core), never an
//! error. This enum covers the remaining failure surfaces: configuration,
//! marker persistence, serialization, and plain I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Census operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Census.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing server URL, unreadable config file).
    #[error("configuration error: {0}")]
    Config(String),

    /// The submission marker could not be persisted.
    ///
    /// Raised only by `mark_submitted`; a marker that cannot be written
    /// means a future run will offer submission again.
    #[error("could not persist submission marker at {}: {source}", path.display())]
    Guard {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload or state serialization failed.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// File I/O error outside the guard path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the error stems from user-correctable configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = Error::Config("no server URL configured".into());
        assert_eq!(
            err.to_string(),
            "configuration error: no server URL configured"
        );
        assert!(err.is_config());
    }

    #[test]
    fn guard_error_carries_path() {
        let err = Error::Guard {
            path: PathBuf::from("/var/lib/census/submitted"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/var/lib/census/submitted"));
        assert!(!err.is_config());
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
