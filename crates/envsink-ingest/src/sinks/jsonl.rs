//! JSON-lines file sink
//!
//! Appends one JSON line per record. The file is opened in append mode and
//! closed again for every record; throughput is traded for simplicity, and
//! existing content is never truncated.

use super::Sink;
use crate::batcher::Batch;
use crate::error::{Result, SinkError};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Default output file
pub const DEFAULT_JSONL_PATH: &str = "./data/telemetry.jsonl";

#[derive(Debug, Clone)]
pub struct JsonLinesConfig {
    pub path: PathBuf,
}

impl Default for JsonLinesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_JSONL_PATH),
        }
    }
}

impl JsonLinesConfig {
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(SinkError::config("JSON-lines output path cannot be empty"));
        }
        Ok(())
    }
}

pub struct JsonLinesSink {
    config: JsonLinesConfig,
    parent_ready: bool,
}

impl JsonLinesSink {
    pub fn new(config: JsonLinesConfig) -> Self {
        Self {
            config,
            parent_ready: false,
        }
    }

    fn ensure_parent_dir(&mut self) -> Result<()> {
        if self.parent_ready {
            return Ok(());
        }

        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
                debug!(dir = %parent.display(), "Ensured output directory");
            }
        }

        self.parent_ready = true;
        Ok(())
    }

    fn append_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

#[async_trait]
impl Sink for JsonLinesSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn consume(&mut self, batch: Batch) -> Result<()> {
        self.ensure_parent_dir()?;

        for record in &batch {
            self.append_line(&record.to_json())?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use envsink_common::{MacAddress, TelemetryRecord};
    use tempfile::TempDir;

    fn record(seq: i32) -> TelemetryRecord {
        TelemetryRecord {
            temperature_millicelsius: 22750,
            humidity: 455000,
            pressure: 101200,
            battery_potential: 3010,
            tx_power: 4,
            movement_counter: 0,
            measurement_sequence_number: seq,
            measurement_ts_ms: 1700000000000 + i64::from(seq),
            mac_address: MacAddress::from([1, 2, 3, 4, 5, 6]),
        }
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/out.jsonl");
        let mut sink = JsonLinesSink::new(JsonLinesConfig { path: path.clone() });

        sink.consume(vec![record(1)]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{}\n", record(1).to_json()));
    }

    #[tokio::test]
    async fn test_appends_and_never_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(&path, "existing\n").unwrap();

        let mut sink = JsonLinesSink::new(JsonLinesConfig { path: path.clone() });
        sink.consume(vec![record(1), record(2)]).await.unwrap();

        // A fresh sink on the same path keeps appending
        let mut sink = JsonLinesSink::new(JsonLinesConfig { path: path.clone() });
        sink.consume(vec![record(3)]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "existing");
        let seqs: Vec<i32> = lines[1..]
            .iter()
            .map(|l| TelemetryRecord::parse(l).unwrap().measurement_sequence_number)
            .collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unwritable_path_is_fatal() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending
        let mut sink = JsonLinesSink::new(JsonLinesConfig {
            path: dir.path().to_path_buf(),
        });

        let err = sink.consume(vec![record(1)]).await.unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_path_rejected() {
        let config = JsonLinesConfig {
            path: PathBuf::new(),
        };
        assert!(matches!(config.validate(), Err(SinkError::Config(_))));
    }
}
