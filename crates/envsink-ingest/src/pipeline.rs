//! Pipeline driver
//!
//! Wires a [`Source`] through a [`Batcher`] sized by the sink's preferences
//! and awaits each [`Sink::consume`] before reading further, so input is
//! paused while a batch is in flight.

use crate::batcher::{Batcher, BatcherEvent};
use crate::error::SinkError;
use crate::sinks::Sink;
use crate::source::Source;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a run ended early
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input stream failed: {0}")]
    Source(#[source] std::io::Error),

    #[error("Sink '{sink}' failed: {source}")]
    Sink {
        sink: &'static str,
        #[source]
        source: SinkError,
    },
}

/// Counters for a finished run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub batches: u64,
    pub records: u64,
    pub rejected_lines: u64,
    pub failed_batches: u64,
}

/// Drive `source` into `sink` until the input ends
///
/// Non-fatal sink errors are logged and the run continues with the next
/// batch. A fatal sink error or a read failure ends the run.
pub async fn run<S: Source>(
    source: S,
    sink: &mut dyn Sink,
) -> Result<PipelineStats, PipelineError> {
    let mut batcher = Batcher::new(
        source,
        sink.desired_batch_size(),
        sink.desired_max_batch_latency(),
    );
    let mut stats = PipelineStats::default();

    info!(
        sink = sink.name(),
        batch_size = batcher.max_size(),
        batch_latency_ms = batcher.max_latency().as_millis() as u64,
        "Pipeline started"
    );

    while let Some(event) = batcher.next().await {
        match event {
            BatcherEvent::Batch(batch) => {
                let records = batch.len();
                stats.batches += 1;
                stats.records += records as u64;

                match sink.consume(batch).await {
                    Ok(()) => debug!(sink = sink.name(), records, "Batch delivered"),
                    Err(e) if e.is_fatal() => {
                        error!(sink = sink.name(), records, error = %e, "Sink failed, stopping");
                        return Err(PipelineError::Sink {
                            sink: sink.name(),
                            source: e,
                        });
                    },
                    Err(e) => {
                        stats.failed_batches += 1;
                        warn!(sink = sink.name(), records, error = %e, "Batch not delivered");
                    },
                }
            },
            BatcherEvent::Rejected(e) => {
                stats.rejected_lines += 1;
                warn!(error = %e, "Skipping unparseable line");
            },
            BatcherEvent::ReadFailed(e) => {
                error!(error = %e, "Input stream failed");
                return Err(PipelineError::Source(e));
            },
        }
    }

    info!(
        sink = sink.name(),
        batches = stats.batches,
        records = stats.records,
        rejected_lines = stats.rejected_lines,
        failed_batches = stats.failed_batches,
        "Pipeline finished"
    );
    Ok(stats)
}
