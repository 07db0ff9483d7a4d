//! Record ownership and the access gate.
//!
//! A caller may touch a hardware record only if they own it, and a speed
//! test result only if they own the hardware it was recorded against.
//! Administrators are let through by the calling policy before this gate is
//! consulted; `authorize` itself never grants anything beyond ownership.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user: u64) -> Self {
        Self {
            user: UserId(user),
            is_admin: false,
        }
    }

    pub fn admin(user: u64) -> Self {
        Self {
            user: UserId(user),
            is_admin: true,
        }
    }
}

/// A piece of customer hardware. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareRecord {
    pub id: u64,
    pub serial: String,
    pub nickname: String,
    pub owner: UserId,
}

/// A stored measurement, labelled with its provider classification.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedTestRecord {
    pub id: u64,
    /// Hardware the test was recorded against. Results without one are
    /// never accessible through the gate.
    pub hardware: Option<Arc<HardwareRecord>>,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: f64,
    /// Client-measured value, stored as given.
    pub jitter_ms: f64,
    pub isp_name: String,
    pub is_starlink: bool,
    pub client_ip: Option<String>,
    /// Unix seconds.
    pub created_at: u64,
}

/// Anything the gate can be asked about.
#[derive(Debug, Clone, Copy)]
pub enum OwnershipTarget<'a> {
    Hardware(&'a HardwareRecord),
    SpeedTest(&'a SpeedTestRecord),
}

impl<'a> From<&'a HardwareRecord> for OwnershipTarget<'a> {
    fn from(record: &'a HardwareRecord) -> Self {
        OwnershipTarget::Hardware(record)
    }
}

impl<'a> From<&'a SpeedTestRecord> for OwnershipTarget<'a> {
    fn from(record: &'a SpeedTestRecord) -> Self {
        OwnershipTarget::SpeedTest(record)
    }
}

impl OwnershipTarget<'_> {
    /// Owner of the target, following the hardware reference for results.
    pub fn owner(&self) -> Option<UserId> {
        match self {
            OwnershipTarget::Hardware(hw) => Some(hw.owner),
            OwnershipTarget::SpeedTest(result) => result.hardware.as_ref().map(|hw| hw.owner),
        }
    }
}

/// Whether `actor` owns `target`. Anything without an owner is denied.
pub fn authorize<'a>(actor: &Actor, target: impl Into<OwnershipTarget<'a>>) -> bool {
    target.into().owner() == Some(actor.user)
}
