//! Error types for balloonwatch.
//!
//! Only parameter validation escapes the analytic core. Transport and
//! data-quality failures are modeled here so sources can report them, but the
//! fetcher turns them into empty snapshots instead of propagating them.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for balloonwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// Requested snapshot offset is outside the source's retention window.
    #[error("hours_ago must be between 0 and {} (got {hours_ago})", .limit.saturating_sub(1))]
    HoursOutOfRange {
        /// The rejected offset.
        hours_ago: i64,
        /// Exclusive upper bound of valid offsets.
        limit: u32,
    },

    /// A trajectory was rebuilt from positions that cannot form one.
    #[error("invalid trajectory: {message}")]
    InvalidTrajectory {
        /// Description of the problem.
        message: String,
    },

    // === Source Errors ===
    /// The snapshot could not be retrieved.
    #[error("failed to fetch {url}: {message}")]
    Transport {
        /// URL (or source identifier) that was requested.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The snapshot body was not a JSON array.
    #[error("malformed snapshot body from {url}: {message}")]
    MalformedSnapshot {
        /// URL (or source identifier) that was requested.
        url: String,
        /// Description of the shape problem.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Narrator Errors ===
    /// The narrator backend cannot be used as configured.
    #[error("narrator unavailable: {0}")]
    NarratorUnavailable(String),

    /// The narrator backend returned an error or an unusable response.
    #[error("narrator '{backend}' failed: {message}")]
    Narrator {
        /// Name of the backend.
        backend: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for balloonwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a transport error.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-snapshot error.
    #[must_use]
    pub fn malformed_snapshot(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a narrator failure for the given backend.
    #[must_use]
    pub fn narrator(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Narrator {
            backend,
            message: message.into(),
        }
    }

    /// Check if this error is a caller contract violation.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::HoursOutOfRange { .. } | Self::InvalidTrajectory { .. }
        )
    }

    /// Check if this error comes from the snapshot source and should degrade
    /// to "no data" rather than abort.
    #[must_use]
    pub fn is_source_error(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::MalformedSnapshot { .. })
    }
}
