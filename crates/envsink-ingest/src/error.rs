//! Error types for the ingest pipeline
//!
//! Errors are split by where they surface: [`SourceError`] while reading
//! input, [`SinkError`] while delivering a batch. [`SinkError::is_fatal`]
//! decides whether the pipeline keeps running.

use envsink_common::TelemetryError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Conditions reported by a [`crate::source::Source`]
#[derive(Error, Debug)]
pub enum SourceError {
    /// Input closed; a clean termination signal
    #[error("End of input")]
    EndOfInput,

    /// A line was present but could not be decoded; the stream continues
    #[error(transparent)]
    ParseFailure(#[from] TelemetryError),

    /// The underlying stream failed; terminal
    #[error("Failed to read input: {0}")]
    Read(#[from] std::io::Error),
}

/// Errors raised while delivering a batch
#[derive(Error, Debug)]
pub enum SinkError {
    /// Table identifier does not match `^[a-zA-Z_][a-zA-Z0-9_]*$`
    #[error("Invalid table name: '{0}'. Table names must start with a letter or underscore and contain only letters, digits and underscores.")]
    InvalidTableName(String),

    /// Record could not be converted for the target
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// DuckDB statement or connection failed
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    /// HTTP client could not be built or a request failed outright
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Payload could not be encoded
    #[error("Failed to encode payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sink configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SinkError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the pipeline must stop after this error
    ///
    /// File and database failures end the run; record-level conversion
    /// failures and transport errors do not.
    pub fn is_fatal(&self) -> bool {
        match self {
            SinkError::InvalidTableName(_)
            | SinkError::Io(_)
            | SinkError::Database(_)
            | SinkError::Config(_) => true,
            SinkError::Telemetry(_) | SinkError::Http(_) | SinkError::Serialization(_) => false,
        }
    }
}

/// Outcome of a single HTTP delivery attempt that warrants a retry
#[derive(Error, Debug)]
pub enum HttpSendError {
    /// Request exceeded the configured timeout
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Server answered with a 5xx status
    #[error("Server error from {url}: HTTP {status}")]
    Server { url: String, status: u16 },

    /// Connection refused, reset, DNS failure and similar
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_classification() {
        assert!(SinkError::InvalidTableName("x-y".into()).is_fatal());
        assert!(SinkError::Io(std::io::Error::other("disk")).is_fatal());
        assert!(SinkError::config("missing url").is_fatal());
        assert!(!SinkError::Telemetry(TelemetryError::InvalidMacAddress(4)).is_fatal());
    }

    #[test]
    fn test_invalid_mac_message_is_preserved() {
        let err = SinkError::from(TelemetryError::InvalidMacAddress(5));
        assert_eq!(err.to_string(), "Invalid MAC address length: 5, expected 6");
    }
}
