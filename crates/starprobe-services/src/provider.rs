//! Provider classification — who carries the caller's traffic.
//!
//! The lookup itself sits behind [`ProviderLookup`] so the classifier never
//! sees the transport. Every failure mode collapses into
//! [`ProviderInfo::degraded`]; classification must never hold up a
//! measurement.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use starprobe_core::error::{MeasureError, MeasureResult};
use starprobe_core::{LookupRecord, ProviderInfo};

/// Source of raw provider metadata for an address.
#[async_trait]
pub trait ProviderLookup: Send + Sync {
    async fn lookup(&self, ip: IpAddr) -> MeasureResult<LookupRecord>;
}

/// Lookup against an `ip-api.com` compatible JSON endpoint.
pub struct IpApiLookup {
    client: reqwest::Client,
    base_url: String,
}

impl IpApiLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> MeasureResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MeasureError::ClassificationUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProviderLookup for IpApiLookup {
    async fn lookup(&self, ip: IpAddr) -> MeasureResult<LookupRecord> {
        let url = format!("{}/{}", self.base_url, ip);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MeasureError::ClassificationUnavailable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(MeasureError::ClassificationUnavailable(format!(
                "lookup returned {}",
                resp.status()
            )));
        }
        let record: LookupRecord = resp
            .json()
            .await
            .map_err(|e| MeasureError::ClassificationUnavailable(e.to_string()))?;
        if record.status != "success" {
            return Err(MeasureError::ClassificationUnavailable(format!(
                "lookup status {:?}",
                record.status
            )));
        }
        Ok(record)
    }
}

/// Classifies caller addresses. Cheap to clone; holds no per-call state.
#[derive(Clone)]
pub struct ProviderClassifier {
    lookup: Arc<dyn ProviderLookup>,
    timeout: Duration,
}

impl ProviderClassifier {
    pub fn new(lookup: Arc<dyn ProviderLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// Classify `ip`. Loopback callers get the fixed development record
    /// without a lookup; anything that is not an address is degraded
    /// without one.
    pub async fn classify(&self, ip: &str) -> ProviderInfo {
        let Ok(addr) = ip.parse::<IpAddr>() else {
            if !ip.is_empty() {
                tracing::debug!(ip, "not an address, skipping provider lookup");
            }
            return ProviderInfo::degraded(ip);
        };
        if addr.is_loopback() {
            return ProviderInfo::from_record(ip, LookupRecord::development(ip));
        }

        match tokio::time::timeout(self.timeout, self.lookup.lookup(addr)).await {
            Ok(Ok(record)) => {
                let info = ProviderInfo::from_record(ip, record);
                tracing::debug!(
                    ip,
                    isp = info.isp_name(),
                    satellite = info.is_satellite_isp(),
                    "provider classified"
                );
                info
            }
            Ok(Err(e)) => {
                tracing::warn!(ip, error = %e, "provider lookup failed");
                ProviderInfo::degraded(ip)
            }
            Err(_) => {
                tracing::warn!(
                    ip,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "provider lookup timed out"
                );
                ProviderInfo::degraded(ip)
            }
        }
    }
}
