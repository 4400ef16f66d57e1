//! Telemetry sources
//!
//! A [`Source`] yields one [`TelemetryRecord`] per call. Malformed input is
//! reported as [`SourceError::ParseFailure`] and the next call continues with
//! the following line; [`SourceError::EndOfInput`] ends the sequence.

use crate::error::SourceError;
use async_trait::async_trait;
use envsink_common::{TelemetryError, TelemetryRecord};
use std::io;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// Producer of telemetry records
///
/// `next_record` must be cancel safe: the batcher races it against the batch
/// latency timer and drops the future when the timer wins. Dropping it must
/// not lose a line.
#[async_trait]
pub trait Source: Send {
    async fn next_record(&mut self) -> Result<TelemetryRecord, SourceError>;
}

/// Boxed reader used for runtime-selected inputs
pub type DynReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Line-delimited JSON source over any buffered async reader
pub struct LineSource<R> {
    lines: Lines<R>,
    line_number: u64,
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Number of physical lines consumed so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

impl LineSource<DynReader> {
    /// Read from standard input
    pub fn stdin() -> Self {
        Self::new(Box::new(BufReader::new(tokio::io::stdin())))
    }

    /// Read from a file
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        Ok(Self::new(Box::new(BufReader::new(file))))
    }

    /// Read from `path` when given, stdin otherwise
    pub async fn from_input(path: Option<&Path>) -> std::io::Result<Self> {
        match path {
            Some(path) => Self::open(path).await,
            None => Ok(Self::stdin()),
        }
    }
}

#[async_trait]
impl<R> Source for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_record(&mut self) -> Result<TelemetryRecord, SourceError> {
        loop {
            // `Lines::next_line` is cancel safe, and nothing else awaits here
            let next = match self.lines.next_line().await {
                Ok(next) => next,
                // The offending line is already consumed; the next call reads on
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    self.line_number += 1;
                    return Err(SourceError::ParseFailure(TelemetryError::InvalidEncoding {
                        line_number: self.line_number,
                    }));
                },
                Err(e) => return Err(SourceError::Read(e)),
            };
            let Some(line) = next else {
                return Err(SourceError::EndOfInput);
            };
            self.line_number += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return TelemetryRecord::parse(line).map_err(SourceError::from);
        }
    }
}
