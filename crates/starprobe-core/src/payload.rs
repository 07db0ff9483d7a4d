//! Synthetic download payload.
//!
//! Filling a buffer from an RNG is the expensive part of a download, so a
//! session generates one block up front and re-emits it. Nothing depends on
//! the bytes being unpredictable.

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::{MeasureError, MeasureResult};

/// Produces reusable blocks of pseudo-random bytes.
pub struct PayloadGenerator<R = StdRng> {
    rng: R,
}

impl PayloadGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for PayloadGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> PayloadGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate exactly `chunk_size` bytes. Zero is rejected.
    pub fn generate(&mut self, chunk_size: usize) -> MeasureResult<Bytes> {
        if chunk_size == 0 {
            return Err(MeasureError::InvalidArgument(
                "chunk size must be positive".to_string(),
            ));
        }
        let mut block = vec![0u8; chunk_size];
        self.rng.fill_bytes(&mut block);
        Ok(Bytes::from(block))
    }
}
