//! Error taxonomy shared by the measurement engine.

/// Failures raised by measurement, classification and access checks.
///
/// Only `StreamRead` and `Unauthorized` ever reach a client. Size problems
/// are clamped or defaulted before they get here, and classification
/// failures degrade to an "Unknown" provider.
#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("stream read failed after {received} bytes: {reason}")]
    StreamRead { received: u64, reason: String },
    #[error("provider lookup unavailable: {0}")]
    ClassificationUnavailable(String),
    #[error("caller is not authorized for this record")]
    Unauthorized,
}

pub type MeasureResult<T> = Result<T, MeasureError>;
