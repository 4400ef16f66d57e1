//! Output sinks
//!
//! Every sink implements [`Sink`]. The pipeline driver only sees
//! `Box<dyn Sink>`, asks it for its preferred batch size and latency, and
//! hands it one batch at a time.
//!
//! | Sink | Batch size | Retry |
//! |------|-----------|-------|
//! | [`console::ConsoleSink`] | 1 | none |
//! | [`jsonl::JsonLinesSink`] | 1 | none |
//! | [`duckdb::DuckDbSink`] | configured (default 100) | none |
//! | [`http::HttpSink`] | configured (default 50) | exponential backoff |

pub mod console;
pub mod duckdb;
pub mod http;
pub mod jsonl;

use crate::batcher::Batch;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use self::console::ConsoleSink;
pub use self::duckdb::{DuckDbConfig, DuckDbSink};
pub use self::http::{HttpSink, HttpSinkConfig};
pub use self::jsonl::{JsonLinesConfig, JsonLinesSink};

/// Latency ceiling used by sinks that do not batch
pub const DEFAULT_MAX_BATCH_LATENCY: Duration = Duration::from_secs(1);

/// Consumer of telemetry batches
#[async_trait]
pub trait Sink: Send {
    /// Short name used in log fields
    fn name(&self) -> &'static str;

    fn desired_batch_size(&self) -> usize {
        1
    }

    fn desired_max_batch_latency(&self) -> Duration {
        DEFAULT_MAX_BATCH_LATENCY
    }

    /// Deliver one batch
    ///
    /// Called once per batch, never concurrently. Resources acquired here are
    /// released before returning, on success and on failure.
    async fn consume(&mut self, batch: Batch) -> Result<()>;
}

/// Which sink to run, with its settings
#[derive(Debug, Clone)]
pub enum SinkConfig {
    Console,
    JsonLines(JsonLinesConfig),
    DuckDb(DuckDbConfig),
    Http(HttpSinkConfig),
}

impl SinkConfig {
    /// Check the configuration before anything is read from the input
    pub fn validate(&self) -> Result<()> {
        match self {
            SinkConfig::Console => Ok(()),
            SinkConfig::JsonLines(config) => config.validate(),
            SinkConfig::DuckDb(config) => config.validate(),
            SinkConfig::Http(config) => config.validate(),
        }
    }
}

/// Construct the configured sink
pub fn build_sink(config: SinkConfig) -> Result<Box<dyn Sink>> {
    config.validate()?;

    let sink: Box<dyn Sink> = match config {
        SinkConfig::Console => Box::new(ConsoleSink::stdout()),
        SinkConfig::JsonLines(config) => Box::new(JsonLinesSink::new(config)),
        SinkConfig::DuckDb(config) => Box::new(DuckDbSink::new(config)),
        SinkConfig::Http(config) => Box::new(HttpSink::new(config)?),
    };

    Ok(sink)
}
