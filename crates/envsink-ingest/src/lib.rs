//! envsink Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Reads newline-delimited telemetry records and relays them to one sink.
//!
//! # Overview
//!
//! - **Source**: [`source::LineSource`] decodes one record per input line
//! - **Batching**: [`batcher::Batcher`] groups records by size and latency
//! - **Sinks**: console, JSON-lines file, DuckDB (direct or DuckLake) and HTTP
//! - **Pipeline**: [`pipeline::run`] drives records from source to sink
//!
//! # Example
//!
//! ```no_run
//! use envsink_ingest::sinks::{build_sink, DuckDbConfig, SinkConfig};
//! use envsink_ingest::source::LineSource;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut sink = build_sink(SinkConfig::DuckDb(DuckDbConfig::direct("telemetry.duckdb")))?;
//! let source = LineSource::open("readings.jsonl").await?;
//! let stats = envsink_ingest::pipeline::run(source, sink.as_mut()).await?;
//! println!("{} records", stats.records);
//! # Ok(())
//! # }
//! ```

pub mod batcher;
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod sinks;
pub mod source;

// Re-export commonly used types
pub use cli::{Cli, Commands};
pub use error::{Result, SinkError, SourceError};
pub use pipeline::{PipelineError, PipelineStats};
pub use sinks::{build_sink, Sink, SinkConfig};
