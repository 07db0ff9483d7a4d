//! starprobe-services — the measurement engine behind the HTTP API.

pub mod download;
pub mod provider;
pub mod records;
pub mod upload;

pub use download::{DownloadProgress, DownloadStreamer};
pub use provider::{IpApiLookup, ProviderClassifier, ProviderLookup};
pub use records::{
    check_access, record_result, RecordError, RecordStore, SubmittedMeasurement,
    DEFAULT_RESULT_LIMIT,
};
pub use upload::UploadConsumer;
