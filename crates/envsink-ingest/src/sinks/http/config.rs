//! HTTP sink configuration

use crate::error::{Result, SinkError};
use envsink_common::MacAddress;
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// HTTP Sink Constants
// ============================================================================

pub const DEFAULT_HTTP_API_URL: &str = "http://localhost:8080";

pub const DEFAULT_HTTP_BATCH_SIZE: usize = 50;

pub const DEFAULT_HTTP_BATCH_LATENCY_MS: u64 = 10_000;

/// Per-request timeout, covering connect through response body
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_HTTP_MAX_RETRIES: u32 = 3;

/// First retry delay; doubles on every further retry
pub const DEFAULT_HTTP_INITIAL_BACKOFF_MS: u64 = 1_000;

/// Path appended to the API base URL
pub const TELEMETRY_PATH: &str = "telemetry";

#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// API base URL, e.g. `https://api.example.com/v1`
    pub api_url: String,

    pub batch_size: usize,

    pub batch_latency: Duration,

    pub timeout: Duration,

    pub max_retries: u32,

    pub initial_backoff: Duration,

    /// MAC display string (uppercase) to sensor name
    pub sensor_names: HashMap<String, String>,

    /// Log request payloads and response bodies at debug level
    pub debug: bool,
}

impl Default for HttpSinkConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_HTTP_API_URL.to_string(),
            batch_size: DEFAULT_HTTP_BATCH_SIZE,
            batch_latency: Duration::from_millis(DEFAULT_HTTP_BATCH_LATENCY_MS),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_retries: DEFAULT_HTTP_MAX_RETRIES,
            initial_backoff: Duration::from_millis(DEFAULT_HTTP_INITIAL_BACKOFF_MS),
            sensor_names: HashMap::new(),
            debug: false,
        }
    }
}

impl HttpSinkConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Full URL batches are posted to
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), TELEMETRY_PATH)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(SinkError::config(format!(
                "API URL '{}' is invalid: must start with http:// or https://",
                self.api_url
            )));
        }

        if self.batch_size == 0 {
            return Err(SinkError::config("HTTP batch size must be greater than 0"));
        }

        if self.timeout.is_zero() {
            return Err(SinkError::config("HTTP timeout must be greater than 0"));
        }

        for mac in self.sensor_names.keys() {
            MacAddress::from_display(mac).map_err(|e| {
                SinkError::config(format!("Invalid sensor name mapping for '{}': {}", mac, e))
            })?;
        }

        Ok(())
    }
}

/// Parse `MAC=NAME` pairs separated by commas
///
/// MACs are normalized to uppercase so lookups match the display form.
pub fn parse_sensor_names(entries: &str) -> Result<HashMap<String, String>> {
    let mut names = HashMap::new();

    for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (mac, name) = entry.split_once('=').ok_or_else(|| {
            SinkError::config(format!(
                "Invalid sensor name entry '{}': expected MAC=NAME",
                entry
            ))
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(SinkError::config(format!(
                "Sensor name for '{}' cannot be empty",
                mac.trim()
            )));
        }

        names.insert(mac.trim().to_uppercase(), name.to_string());
    }

    Ok(names)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_path() {
        assert_eq!(
            HttpSinkConfig::new("http://api.local:9000").endpoint(),
            "http://api.local:9000/telemetry"
        );
        assert_eq!(
            HttpSinkConfig::new("https://api.local/v1/").endpoint(),
            "https://api.local/v1/telemetry"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = HttpSinkConfig::new("ftp://api.local");
        assert!(matches!(config.validate(), Err(SinkError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = HttpSinkConfig {
            timeout: Duration::ZERO,
            ..HttpSinkConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_sensor_names() {
        let names = parse_sensor_names("fe:26:88:7a:66:66=sauna, AA:BB:CC:DD:EE:FF = porch").unwrap();
        assert_eq!(names.get("FE:26:88:7A:66:66").map(String::as_str), Some("sauna"));
        assert_eq!(names.get("AA:BB:CC:DD:EE:FF").map(String::as_str), Some("porch"));
        assert!(parse_sensor_names("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_sensor_names_rejects_malformed_entries() {
        assert!(parse_sensor_names("FE:26:88:7A:66:66").is_err());
        assert!(parse_sensor_names("FE:26:88:7A:66:66=").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_mapping_key() {
        let mut config = HttpSinkConfig::default();
        config
            .sensor_names
            .insert("not-a-mac".to_string(), "attic".to_string());
        assert!(matches!(config.validate(), Err(SinkError::Config(_))));
    }
}
