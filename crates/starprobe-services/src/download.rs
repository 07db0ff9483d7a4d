//! Download measurement — streams a synthetic payload of an exact length.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;

use starprobe_core::error::{MeasureError, MeasureResult};
use starprobe_core::measurement::clamp_download_size;
use starprobe_core::PayloadGenerator;

/// Shared view of a download's progress. Outlives the streamer, so a caller
/// can tell a completed transfer from an abandoned one after the body is
/// gone.
#[derive(Debug, Clone, Default)]
pub struct DownloadProgress {
    emitted: Arc<AtomicU64>,
    complete: Arc<AtomicBool>,
}

impl DownloadProgress {
    pub fn emitted_bytes(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// True once the final chunk has been handed out and the stream ended.
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }
}

/// One download session.
///
/// Owns a single random block and hands out refcounted slices of it, so the
/// memory held is bounded by the chunk size no matter how large the
/// download. Yields chunks only when polled; once exhausted it stays
/// exhausted.
pub struct DownloadStreamer {
    block: Bytes,
    total: u64,
    emitted: u64,
    progress: DownloadProgress,
}

impl DownloadStreamer {
    /// Session emitting exactly `total` bytes in chunks of `chunk_size`.
    /// An empty session allocates no payload.
    pub fn new(total: u64, chunk_size: usize) -> MeasureResult<Self> {
        if chunk_size == 0 {
            return Err(MeasureError::InvalidArgument(
                "chunk size must be positive".to_string(),
            ));
        }
        let block = if total == 0 {
            Bytes::new()
        } else {
            let block_len = chunk_size.min(usize::try_from(total).unwrap_or(usize::MAX));
            PayloadGenerator::new().generate(block_len)?
        };
        Ok(Self {
            block,
            total,
            emitted: 0,
            progress: DownloadProgress::default(),
        })
    }

    /// Session for a raw client request, clamped into `0..=max`.
    pub fn for_request(requested: i64, chunk_size: usize, max: u64) -> MeasureResult<Self> {
        Self::new(clamp_download_size(requested, max), chunk_size)
    }

    /// Length the client will receive; known before the first chunk.
    pub fn total_bytes(&self) -> u64 {
        self.total
    }

    pub fn emitted_bytes(&self) -> u64 {
        self.emitted
    }

    pub fn progress(&self) -> DownloadProgress {
        self.progress.clone()
    }

    /// Adapt into a body stream. The error type is uninhabited.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
        futures::stream::iter(self.map(Ok))
    }
}

impl Iterator for DownloadStreamer {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        let needed = self.total - self.emitted;
        if needed == 0 || self.block.is_empty() {
            if !self.progress.is_complete() {
                self.progress.complete.store(true, Ordering::Release);
                tracing::debug!(bytes = self.total, "download stream complete");
            }
            return None;
        }
        let take = (self.block.len() as u64).min(needed) as usize;
        self.emitted += take as u64;
        self.progress.emitted.store(self.emitted, Ordering::Relaxed);
        Some(self.block.slice(..take))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.block.is_empty() {
            return (0, Some(0));
        }
        let remaining = self.total - self.emitted;
        let chunks = remaining.div_ceil(self.block.len() as u64);
        let chunks = usize::try_from(chunks).unwrap_or(usize::MAX);
        (chunks, Some(chunks))
    }
}

impl Drop for DownloadStreamer {
    fn drop(&mut self) {
        if self.emitted < self.total {
            tracing::debug!(
                emitted = self.emitted,
                total = self.total,
                "download stream dropped before completion"
            );
        }
    }
}
