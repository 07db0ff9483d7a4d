//! In-memory hardware and speed test records.
//!
//! Stand-in for the durable store that owns these records in production.
//! Hardware is immutable once registered and shared by `Arc`, so a result's
//! hardware reference always reports the owner it was recorded under.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Deserialize;

use starprobe_core::error::MeasureError;
use starprobe_core::{authorize, Actor, HardwareRecord, ProviderInfo, SpeedTestRecord, UserId};

use crate::provider::ProviderClassifier;

/// Default page size for result listings.
pub const DEFAULT_RESULT_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("hardware {0} not found")]
    HardwareNotFound(u64),
    #[error("result {0} not found")]
    ResultNotFound(u64),
    #[error("hardware serial {0:?} already registered")]
    DuplicateSerial(String),
    #[error(transparent)]
    Measure(#[from] MeasureError),
}

/// Client-measured values accompanying a submission.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SubmittedMeasurement {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: f64,
    #[serde(default)]
    pub jitter_ms: f64,
}

#[derive(Clone, Default)]
pub struct RecordStore {
    hardware: Arc<DashMap<u64, Arc<HardwareRecord>>>,
    /// Serial → hardware id. Claimed before the record is inserted.
    serials: Arc<DashMap<String, u64>>,
    results: Arc<DashMap<u64, SpeedTestRecord>>,
    next_id: Arc<AtomicU64>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn register_hardware(
        &self,
        serial: &str,
        nickname: &str,
        owner: UserId,
    ) -> Result<Arc<HardwareRecord>, RecordError> {
        let record = match self.serials.entry(serial.to_string()) {
            Entry::Occupied(_) => return Err(RecordError::DuplicateSerial(serial.to_string())),
            Entry::Vacant(slot) => {
                let record = Arc::new(HardwareRecord {
                    id: self.allocate_id(),
                    serial: serial.to_string(),
                    nickname: nickname.to_string(),
                    owner,
                });
                self.hardware.insert(record.id, record.clone());
                slot.insert(record.id);
                record
            }
        };
        tracing::info!(id = record.id, serial, owner = %owner, "hardware registered");
        Ok(record)
    }

    pub fn hardware(&self, id: u64) -> Option<Arc<HardwareRecord>> {
        self.hardware.get(&id).map(|hw| hw.clone())
    }

    /// Hardware visible to `actor`: everything for admins, owned records
    /// otherwise. Sorted by id.
    pub fn hardware_visible_to(&self, actor: &Actor) -> Vec<Arc<HardwareRecord>> {
        let mut list: Vec<_> = self
            .hardware
            .iter()
            .filter(|hw| actor.is_admin || hw.owner == actor.user)
            .map(|hw| hw.value().clone())
            .collect();
        list.sort_by_key(|hw| hw.id);
        list
    }

    pub fn result(&self, id: u64) -> Option<SpeedTestRecord> {
        self.results.get(&id).map(|r| r.clone())
    }

    /// The caller's own results, newest first, optionally narrowed to one
    /// piece of hardware. `limit` of `None` returns everything.
    pub fn results_owned_by(
        &self,
        owner: UserId,
        hardware_id: Option<u64>,
        limit: Option<usize>,
    ) -> Vec<SpeedTestRecord> {
        let mut list: Vec<_> = self
            .results
            .iter()
            .filter(|r| r.hardware.as_ref().is_some_and(|hw| hw.owner == owner))
            .filter(|r| match hardware_id {
                Some(id) => r.hardware.as_ref().is_some_and(|hw| hw.id == id),
                None => true,
            })
            .map(|r| r.value().clone())
            .collect();
        list.sort_by(|a, b| b.id.cmp(&a.id));
        if let Some(limit) = limit {
            list.truncate(limit);
        }
        list
    }

    fn insert_result(
        &self,
        hardware: Arc<HardwareRecord>,
        measured: SubmittedMeasurement,
        provider: &ProviderInfo,
        client_ip: &str,
    ) -> SpeedTestRecord {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let record = SpeedTestRecord {
            id: self.allocate_id(),
            hardware: Some(hardware),
            download_mbps: measured.download_mbps,
            upload_mbps: measured.upload_mbps,
            latency_ms: measured.latency_ms,
            jitter_ms: measured.jitter_ms,
            isp_name: provider.isp_name().to_string(),
            is_starlink: provider.is_satellite_isp(),
            client_ip: client_ip.parse::<IpAddr>().ok().map(|addr| addr.to_string()),
            created_at,
        };
        self.results.insert(record.id, record.clone());
        record
    }
}

/// Gate check with the administrator bypass applied.
pub fn check_access(actor: &Actor, allowed: bool) -> Result<(), MeasureError> {
    if actor.is_admin || allowed {
        Ok(())
    } else {
        Err(MeasureError::Unauthorized)
    }
}

/// Record a submitted speed test against `hardware_id`.
///
/// Order matters: the gate runs before the classifier is consulted, so a
/// denied caller never triggers a provider lookup.
pub async fn record_result(
    store: &RecordStore,
    classifier: &ProviderClassifier,
    actor: &Actor,
    hardware_id: u64,
    measured: SubmittedMeasurement,
    client_ip: &str,
) -> Result<SpeedTestRecord, RecordError> {
    let hardware = store
        .hardware(hardware_id)
        .ok_or(RecordError::HardwareNotFound(hardware_id))?;

    if let Err(e) = check_access(actor, authorize(actor, &*hardware)) {
        tracing::info!(user = %actor.user, hardware_id, "result submission denied");
        return Err(e.into());
    }

    let provider = classifier.classify(client_ip).await;
    let record = store.insert_result(hardware, measured, &provider, client_ip);
    tracing::info!(
        id = record.id,
        hardware_id,
        isp = %record.isp_name,
        starlink = record.is_starlink,
        "speed test recorded"
    );
    Ok(record)
}
