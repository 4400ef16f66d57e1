//! Console sink
//!
//! Writes each record as one JSON line, in batch order. Logs go to stderr, so
//! stdout carries nothing but records.

use super::Sink;
use crate::batcher::Batch;
use crate::error::Result;
use async_trait::async_trait;
use std::io::Write;

pub struct ConsoleSink<W = std::io::Stdout> {
    writer: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: Write + Send> Sink for ConsoleSink<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn consume(&mut self, batch: Batch) -> Result<()> {
        for record in &batch {
            writeln!(self.writer, "{}", record.to_json())?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
