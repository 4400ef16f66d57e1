//! Size/latency batching
//!
//! [`Batcher`] groups records from a [`Source`] into batches of at most
//! `max_size` records. A batch is emitted when it is full, when `max_latency`
//! has elapsed since its first record was buffered, or when the source ends.
//! The latency timer is armed by the first record of each batch, so no timer
//! runs while the buffer is empty.

use crate::error::SourceError;
use crate::source::Source;
use envsink_common::{TelemetryError, TelemetryRecord};
use std::time::Duration;
use tokio::time::Instant;

/// An ordered group of records delivered to a sink as one unit
pub type Batch = Vec<TelemetryRecord>;

/// What the batcher hands to the pipeline driver
#[derive(Debug)]
pub enum BatcherEvent {
    /// A batch ready for delivery
    Batch(Batch),

    /// A line that failed to parse; batching continues
    Rejected(TelemetryError),

    /// The input stream failed; no further events follow
    ReadFailed(std::io::Error),
}

pub struct Batcher<S> {
    source: S,
    max_size: usize,
    max_latency: Duration,
    buffer: Batch,
    deadline: Option<Instant>,
    exhausted: bool,
    pending_failure: Option<std::io::Error>,
}

impl<S: Source> Batcher<S> {
    /// `max_size` below 1 is treated as 1
    pub fn new(source: S, max_size: usize, max_latency: Duration) -> Self {
        let max_size = max_size.max(1);
        Self {
            source,
            max_size,
            max_latency,
            buffer: Vec::with_capacity(max_size),
            deadline: None,
            exhausted: false,
            pending_failure: None,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn max_latency(&self) -> Duration {
        self.max_latency
    }

    /// Wait for the next event; `None` once the source is drained
    pub async fn next(&mut self) -> Option<BatcherEvent> {
        if let Some(err) = self.pending_failure.take() {
            return Some(BatcherEvent::ReadFailed(err));
        }

        if self.exhausted {
            return self.take_batch().map(BatcherEvent::Batch);
        }

        loop {
            let outcome = match self.deadline {
                None => Some(self.source.next_record().await),
                Some(deadline) => {
                    tokio::select! {
                        biased;
                        _ = tokio::time::sleep_until(deadline) => None,
                        outcome = self.source.next_record() => Some(outcome),
                    }
                }
            };

            let Some(outcome) = outcome else {
                // Latency elapsed; the deadline only exists while records are buffered
                return self.take_batch().map(BatcherEvent::Batch);
            };

            match outcome {
                Ok(record) => {
                    if self.buffer.is_empty() {
                        self.deadline = Some(Instant::now() + self.max_latency);
                    }
                    self.buffer.push(record);

                    if self.buffer.len() >= self.max_size {
                        return self.take_batch().map(BatcherEvent::Batch);
                    }
                },
                Err(SourceError::ParseFailure(err)) => {
                    return Some(BatcherEvent::Rejected(err));
                },
                Err(SourceError::EndOfInput) => {
                    self.exhausted = true;
                    return self.take_batch().map(BatcherEvent::Batch);
                },
                Err(SourceError::Read(err)) => {
                    self.exhausted = true;
                    return match self.take_batch() {
                        Some(batch) => {
                            self.pending_failure = Some(err);
                            Some(BatcherEvent::Batch(batch))
                        },
                        None => Some(BatcherEvent::ReadFailed(err)),
                    };
                },
            }
        }
    }

    fn take_batch(&mut self) -> Option<Batch> {
        self.deadline = None;
        if self.buffer.is_empty() {
            return None;
        }
        Some(std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.max_size),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::source::LineSource;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn line(seq: i32) -> String {
        format!(
            r#"{{"temperature_millicelsius":20000,"humidity":500000,"pressure":101325,"battery_potential":2900,"tx_power":4,"movement_counter":0,"measurement_sequence_number":{seq},"measurement_ts_ms":1700000000000,"mac_address":[1,2,3,4,5,6]}}"#
        ) + "\n"
    }

    fn sequence_numbers(batch: &Batch) -> Vec<i32> {
        batch.iter().map(|r| r.measurement_sequence_number).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_flushes_after_latency() {
        let (mut writer, reader) = tokio::io::duplex(4096);
        let source = LineSource::new(BufReader::new(reader));
        let mut batcher = Batcher::new(source, 5, Duration::from_secs(30));

        for seq in 0..3 {
            writer.write_all(line(seq).as_bytes()).await.unwrap();
        }

        // The writer stays open: only the timer can flush this batch
        let started = Instant::now();
        let event = batcher.next().await.unwrap();

        match event {
            BatcherEvent::Batch(batch) => assert_eq!(sequence_numbers(&batch), vec![0, 1, 2]),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        drop(writer);
        assert!(batcher.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_batches_flush_without_waiting() {
        let (mut writer, reader) = tokio::io::duplex(8192);
        let source = LineSource::new(BufReader::new(reader));
        let mut batcher = Batcher::new(source, 5, Duration::from_secs(30));

        for seq in 0..10 {
            writer.write_all(line(seq).as_bytes()).await.unwrap();
        }

        let started = Instant::now();
        let mut batches = Vec::new();
        for _ in 0..2 {
            match batcher.next().await.unwrap() {
                BatcherEvent::Batch(batch) => batches.push(sequence_numbers(&batch)),
                other => panic!("unexpected event: {other:?}"),
            }
        }

        assert_eq!(batches, vec![vec![0, 1, 2, 3, 4], vec![5, 6, 7, 8, 9]]);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_starts_with_first_record() {
        let (mut writer, reader) = tokio::io::duplex(4096);
        let source = LineSource::new(BufReader::new(reader));
        let mut batcher = Batcher::new(source, 5, Duration::from_secs(30));

        let producer = tokio::spawn(async move {
            // Idle time before the first record must not count towards latency
            tokio::time::sleep(Duration::from_secs(100)).await;
            writer.write_all(line(1).as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            writer.write_all(line(2).as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let started = Instant::now();
        match batcher.next().await.unwrap() {
            BatcherEvent::Batch(batch) => assert_eq!(sequence_numbers(&batch), vec![1, 2]),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(started.elapsed(), Duration::from_secs(130));

        producer.await.unwrap();
        assert!(batcher.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_input_flushes_remaining_records() {
        let input = format!("{}{}", line(1), line(2));
        let source = LineSource::new(input.as_bytes());
        let mut batcher = Batcher::new(source, 10, Duration::from_secs(30));

        let started = Instant::now();
        match batcher.next().await.unwrap() {
            BatcherEvent::Batch(batch) => assert_eq!(batch.len(), 2),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(batcher.next().await.is_none());
        assert!(batcher.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_line_keeps_pending_batch() {
        let input = format!("{}garbage\n{}", line(1), line(2));
        let source = LineSource::new(input.as_bytes());
        let mut batcher = Batcher::new(source, 2, Duration::from_secs(30));

        assert!(matches!(
            batcher.next().await,
            Some(BatcherEvent::Rejected(TelemetryError::Parse { .. }))
        ));
        match batcher.next().await.unwrap() {
            BatcherEvent::Batch(batch) => assert_eq!(sequence_numbers(&batch), vec![1, 2]),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(batcher.next().await.is_none());
    }

    #[tokio::test]
    async fn test_size_one_emits_every_record() {
        let input = format!("{}{}{}", line(1), line(2), line(3));
        let source = LineSource::new(input.as_bytes());
        let mut batcher = Batcher::new(source, 0, Duration::from_secs(1));
        assert_eq!(batcher.max_size(), 1);

        let mut sizes = Vec::new();
        while let Some(event) = batcher.next().await {
            if let BatcherEvent::Batch(batch) = event {
                sizes.push(batch.len());
            }
        }
        assert_eq!(sizes, vec![1, 1, 1]);
    }
}
