//! Error types for the telemetry model

use thiserror::Error;

/// Result type alias for telemetry model operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while decoding or formatting telemetry records
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Input line is not valid JSON or misses a required field
    #[error("Failed to parse telemetry line: {source} (line: {line})")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// Input line bytes are not valid UTF-8
    #[error("Line {line_number} is not valid UTF-8")]
    InvalidEncoding { line_number: u64 },

    /// MAC address does not hold exactly six elements
    #[error("Invalid MAC address length: {0}, expected 6")]
    InvalidMacAddress(usize),

    /// MAC address display string is not `XX:XX:XX:XX:XX:XX`
    #[error("Invalid MAC address format: '{0}'")]
    InvalidMacFormat(String),
}

impl TelemetryError {
    /// Create a parse error keeping the offending line
    pub fn parse(line: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            line: line.into(),
            source,
        }
    }
}
