//! starprobe-core — shared types, measurement math, classification and
//! access rules. All other Starprobe crates depend on this one.

pub mod config;
pub mod error;
pub mod measurement;
pub mod ownership;
pub mod payload;
pub mod provider;

pub use error::MeasureError;
pub use measurement::MeasurementResult;
pub use ownership::{authorize, Actor, HardwareRecord, OwnershipTarget, SpeedTestRecord, UserId};
pub use payload::PayloadGenerator;
pub use provider::{LookupRecord, ProviderInfo};
