//! Network provider metadata and the satellite-ISP rule.

use serde::{Deserialize, Serialize};

/// Autonomous system number announced by the satellite ISP.
pub const SATELLITE_ASN: &str = "14593";

/// Label matches are case-sensitive.
const SATELLITE_LABELS: [&str; 2] = ["Starlink", "SpaceX"];

pub const UNKNOWN_LABEL: &str = "Unknown";

/// Raw provider metadata as returned by a lookup service.
///
/// Field names follow the `ip-api.com` JSON shape; every field is optional
/// because the service omits them on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupRecord {
    pub query: String,
    pub status: String,
    pub isp: String,
    pub org: String,
    #[serde(rename = "as")]
    pub asn: String,
}

impl LookupRecord {
    /// Fixed record served for loopback callers during local development.
    pub fn development(ip: &str) -> Self {
        Self {
            query: ip.to_string(),
            status: "success".to_string(),
            isp: "Localhost Development".to_string(),
            org: "SpaceX Starlink (Mock)".to_string(),
            asn: "AS14593 SpaceX Starlink".to_string(),
        }
    }
}

/// Classified provider for one caller address. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub query_ip: String,
    pub status_ok: bool,
    pub isp_label: String,
    pub org_label: String,
    pub asn_label: String,
    is_satellite_isp: bool,
}

impl ProviderInfo {
    /// Build from a lookup record. The satellite flag is always derived.
    pub fn from_record(ip: &str, record: LookupRecord) -> Self {
        let is_satellite_isp = is_satellite_isp(&record.isp, &record.org, &record.asn);
        let query_ip = if record.query.is_empty() {
            ip.to_string()
        } else {
            record.query
        };
        Self {
            query_ip,
            status_ok: record.status == "success",
            isp_label: record.isp,
            org_label: record.org,
            asn_label: record.asn,
            is_satellite_isp,
        }
    }

    /// Result used when the lookup fails for any reason.
    pub fn degraded(ip: &str) -> Self {
        Self::from_record(
            ip,
            LookupRecord {
                query: ip.to_string(),
                status: String::new(),
                isp: UNKNOWN_LABEL.to_string(),
                org: UNKNOWN_LABEL.to_string(),
                asn: String::new(),
            },
        )
    }

    pub fn is_satellite_isp(&self) -> bool {
        self.is_satellite_isp
    }

    /// Display name: the ISP label, or the organization when it is empty.
    pub fn isp_name(&self) -> &str {
        if self.isp_label.is_empty() {
            &self.org_label
        } else {
            &self.isp_label
        }
    }

    /// Flat textual dump of the labels, for the `details` field.
    pub fn details(&self) -> String {
        format!(
            "query={} status={} isp={} org={} as={}",
            self.query_ip,
            if self.status_ok { "success" } else { "fail" },
            self.isp_label,
            self.org_label,
            self.asn_label
        )
    }
}

/// The satellite-ISP heuristic.
pub fn is_satellite_isp(isp: &str, org: &str, asn: &str) -> bool {
    let labelled = SATELLITE_LABELS
        .iter()
        .any(|needle| isp.contains(needle) || org.contains(needle));
    labelled || asn.contains(SATELLITE_ASN)
}
