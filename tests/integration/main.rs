//! starprobe integration test harness.
//!
//! Every test boots the real router on an ephemeral loopback port and talks
//! to it over HTTP. Provider lookups go to an in-process fake, so nothing
//! here touches the network beyond 127.0.0.1.
//!
//!   cargo test --test integration

mod measure;
mod network;
mod records;

use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use starprobe_api::ApiState;
use starprobe_core::config::StarprobeConfig;
use starprobe_core::error::{MeasureError, MeasureResult};
use starprobe_core::LookupRecord;
use starprobe_services::{ProviderClassifier, ProviderLookup, RecordStore};

// ── Harness ───────────────────────────────────────────────────────────────────

/// Forwarded address the fake lookup reports as a satellite link.
pub const SATELLITE_IP: &str = "198.51.100.14";
/// Forwarded address the fake lookup reports as a terrestrial ISP.
pub const CABLE_IP: &str = "203.0.113.9";
/// Forwarded address the fake lookup fails on.
pub const UNREACHABLE_IP: &str = "192.0.2.1";

pub const OWNER: u64 = 1;
pub const STRANGER: u64 = 2;
pub const ADMIN: u64 = 99;

/// Canned provider lookups keyed by address.
pub struct FakeLookup {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ProviderLookup for FakeLookup {
    async fn lookup(&self, ip: IpAddr) -> MeasureResult<LookupRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ip = ip.to_string();
        let (isp, org, asn) = match ip.as_str() {
            SATELLITE_IP => ("SpaceX Services, Inc.", "", "AS14593 SpaceX"),
            CABLE_IP => ("Comcast Cable", "Comcast", "AS7922 Comcast Cable Communications"),
            _ => {
                return Err(MeasureError::ClassificationUnavailable(
                    "no route to lookup".into(),
                ))
            }
        };
        Ok(LookupRecord {
            query: ip,
            status: "success".into(),
            isp: isp.into(),
            org: org.into(),
            asn: asn.into(),
        })
    }
}

pub struct TestServer {
    pub base: String,
    pub lookup: Arc<FakeLookup>,
    pub http: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path))
    }

    pub fn lookups(&self) -> usize {
        self.lookup.calls.load(Ordering::SeqCst)
    }

    /// Register hardware as `user` and return its id.
    pub async fn register(&self, user: u64, serial: &str) -> Result<u64> {
        let resp = self
            .post("/hardware")
            .header("x-user-id", user.to_string())
            .json(&serde_json::json!({ "serial": serial, "nickname": "dish" }))
            .send()
            .await?;
        anyhow::ensure!(resp.status() == 201, "register failed: {}", resp.status());
        let body: serde_json::Value = resp.json().await?;
        body["id"].as_u64().context("missing hardware id")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Test defaults: admin user configured, lookups time out quickly.
pub fn test_config() -> StarprobeConfig {
    let mut config = StarprobeConfig::default();
    config.access.admin_users = vec![ADMIN];
    config.provider.timeout_ms = 500;
    config
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(test_config()).await
}

pub async fn spawn_server_with(config: StarprobeConfig) -> Result<TestServer> {
    let lookup = Arc::new(FakeLookup {
        calls: AtomicUsize::new(0),
    });
    let classifier = ProviderClassifier::new(
        lookup.clone(),
        Duration::from_millis(config.provider.timeout_ms),
    );
    let state = ApiState {
        config: Arc::new(config),
        classifier,
        records: RecordStore::new(),
    };

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(starprobe_api::serve_on(listener, state, async move {
        let _ = rx.await;
    }));

    Ok(TestServer {
        base: format!("http://{}/api", addr),
        lookup,
        http: reqwest::Client::new(),
        shutdown: Some(tx),
    })
}
