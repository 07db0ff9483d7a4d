//! Upload measurement — drains an inbound body and times it.
//!
//! A body may already be fully buffered, arrive as a stream of frames, or
//! be exposed as a reader. All three count bytes the same way and time from
//! the first received byte to end-of-stream. Nothing is reported until the
//! body is exhausted; a read error discards the partial count.

use std::time::Instant;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

use starprobe_core::error::{MeasureError, MeasureResult};
use starprobe_core::MeasurementResult;

pub const DEFAULT_READ_SIZE: usize = 64 * 1024;

/// Drains upload bodies. `read_size` bounds each read on the reader and
/// buffered paths; a streamed body is counted frame by frame as the
/// transport delivers it, whatever the read size.
#[derive(Debug, Clone, Copy)]
pub struct UploadConsumer {
    read_size: usize,
}

impl Default for UploadConsumer {
    fn default() -> Self {
        Self::new(DEFAULT_READ_SIZE)
    }
}

/// Byte counter shared by every input shape.
struct Tally {
    received: u64,
    first_byte: Option<Instant>,
}

impl Tally {
    fn new() -> Self {
        Self {
            received: 0,
            first_byte: None,
        }
    }

    fn record(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.first_byte.get_or_insert_with(Instant::now);
        self.received += n as u64;
    }

    fn fail(&self, reason: impl std::fmt::Display) -> MeasureError {
        MeasureError::StreamRead {
            received: self.received,
            reason: reason.to_string(),
        }
    }

    fn finish(self) -> MeasurementResult {
        let elapsed = self
            .first_byte
            .map(|start| start.elapsed())
            .unwrap_or_default();
        MeasurementResult::from_elapsed(self.received, elapsed)
    }
}

impl UploadConsumer {
    /// Consumer reading at most `read_size` bytes at a time. Zero is
    /// replaced by the default.
    pub fn new(read_size: usize) -> Self {
        let read_size = if read_size == 0 {
            DEFAULT_READ_SIZE
        } else {
            read_size
        };
        Self { read_size }
    }

    pub fn read_size(&self) -> usize {
        self.read_size
    }

    /// Body that was received in full before measurement started.
    pub fn consume_buffered(&self, body: &[u8]) -> MeasurementResult {
        let mut tally = Tally::new();
        for chunk in body.chunks(self.read_size) {
            tally.record(chunk.len());
        }
        tally.finish()
    }

    /// Body delivered as a stream of frames.
    pub async fn consume_stream<S, E>(&self, stream: S) -> MeasureResult<MeasurementResult>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let mut stream = std::pin::pin!(stream);
        let mut tally = Tally::new();
        while let Some(frame) = stream.next().await {
            let frame = frame.map_err(|e| tally.fail(e))?;
            tally.record(frame.len());
        }
        Ok(tally.finish())
    }

    /// Body exposed as a reader, drained in `read_size` reads.
    pub async fn consume_reader<R>(&self, mut reader: R) -> MeasureResult<MeasurementResult>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; self.read_size];
        let mut tally = Tally::new();
        loop {
            let n = reader.read(&mut buf).await.map_err(|e| tally.fail(e))?;
            if n == 0 {
                break;
            }
            tally.record(n);
        }
        Ok(tally.finish())
    }
}
