//! Measurement math: size clamping and throughput.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Floor substituted for a zero measured interval.
pub const MIN_DURATION_SECS: f64 = 1e-4;

/// Clamp a client-requested download size into `0..=max`.
///
/// Oversized and negative requests are corrected silently; a request can
/// never make the server produce more than `max` bytes.
pub fn clamp_download_size(requested: i64, max: u64) -> u64 {
    if requested <= 0 {
        return 0;
    }
    (requested as u64).min(max)
}

/// Megabits per second for `bytes` over `seconds`.
pub fn throughput_mbps(bytes: u64, seconds: f64) -> f64 {
    (bytes as f64 * 8.0) / (seconds * 1_000_000.0)
}

/// Outcome of a fully drained upload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub received_bytes: u64,
    /// Always strictly positive.
    pub duration_seconds: f64,
    pub throughput_mbps: f64,
}

impl MeasurementResult {
    pub fn from_elapsed(received_bytes: u64, elapsed: Duration) -> Self {
        let mut duration_seconds = elapsed.as_secs_f64();
        if duration_seconds <= 0.0 {
            duration_seconds = MIN_DURATION_SECS;
        }
        Self {
            received_bytes,
            duration_seconds,
            throughput_mbps: throughput_mbps(received_bytes, duration_seconds),
        }
    }
}
