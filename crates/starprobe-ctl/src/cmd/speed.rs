//! Ping, download, upload and full-run commands.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use starprobe_core::MeasurementResult;

use super::http::{connect_error, post_json_body, Target};
use super::network;

pub const PING_SAMPLES: usize = 5;
/// Concurrent requests in the `run` download phase, to fill the link.
pub const DOWNLOAD_STREAMS: usize = 4;
pub const DEFAULT_TRANSFER_BYTES: u64 = 10 * 1024 * 1024;
/// Pause between phases so one transfer's tail does not skew the next.
const PHASE_GAP: Duration = Duration::from_millis(200);

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UploadResponse {
    pub received_bytes: u64,
    pub duration_seconds: f64,
    pub calculated_mbps: f64,
}

#[derive(Serialize)]
struct SubmitRequest {
    hardware: u64,
    download_mbps: f64,
    upload_mbps: f64,
    latency_ms: f64,
    jitter_ms: f64,
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: u64,
    isp_name: String,
    is_starlink: bool,
}

// ── Measurements ──────────────────────────────────────────────────────────────

/// Round-trip times of `samples` pings, in milliseconds.
pub async fn ping(target: &Target, samples: usize) -> Result<Vec<f64>> {
    let client = reqwest::Client::new();
    let url = target.url("/ping");
    let mut rtts = Vec::with_capacity(samples);
    for _ in 0..samples {
        let start = Instant::now();
        let resp = client
            .get(&url)
            .send()
            .await
            .with_context(|| connect_error(&url))?;
        if !resp.status().is_success() {
            bail!("ping failed ({})", resp.status());
        }
        rtts.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    Ok(rtts)
}

/// Download `size` bytes and time the transfer from request to last byte.
pub async fn download(target: &Target, size: u64) -> Result<MeasurementResult> {
    download_parallel(target, size, 1).await
}

/// Run `streams` downloads of `size` bytes at once. Throughput is the byte
/// sum over the time from the shared start to the last stream finishing.
pub async fn download_parallel(
    target: &Target,
    size: u64,
    streams: usize,
) -> Result<MeasurementResult> {
    let client = reqwest::Client::new();
    let url = format!("{}?size={}", target.url("/download"), size);
    let start = Instant::now();
    let counts = try_join_all((0..streams.max(1)).map(|_| drain_download(&client, &url))).await?;
    Ok(MeasurementResult::from_elapsed(counts.iter().sum(), start.elapsed()))
}

async fn drain_download(client: &reqwest::Client, url: &str) -> Result<u64> {
    let mut resp = client
        .get(url)
        .send()
        .await
        .with_context(|| connect_error(url))?;
    if !resp.status().is_success() {
        bail!("download failed ({})", resp.status());
    }
    let mut received = 0u64;
    while let Some(chunk) = resp.chunk().await.context("download interrupted")? {
        received += chunk.len() as u64;
    }
    Ok(received)
}

/// Upload `size` zero bytes; returns the server's measurement.
pub async fn upload(target: &Target, size: u64) -> Result<UploadResponse> {
    let body = vec![0u8; usize::try_from(size).context("upload size too large")?];
    let url = target.url("/upload");
    let resp = reqwest::Client::new()
        .post(&url)
        .header("content-type", "application/octet-stream")
        .body(body)
        .send()
        .await
        .with_context(|| connect_error(&url))?;
    if !resp.status().is_success() {
        bail!("upload failed ({})", resp.status());
    }
    resp.json().await.context("failed to parse upload response")
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation of the samples.
fn jitter(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let avg = mean(samples);
    let variance =
        samples.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_ping(target: &Target) -> Result<()> {
    let rtts = ping(target, PING_SAMPLES).await?;
    for (i, rtt) in rtts.iter().enumerate() {
        println!("  ping {}: {:.2} ms", i + 1, rtt);
    }
    println!("  average : {:.2} ms", mean(&rtts));
    println!("  jitter  : {:.2} ms", jitter(&rtts));
    Ok(())
}

pub async fn cmd_download(target: &Target, size: u64) -> Result<()> {
    let result = download(target, size).await?;
    println!(
        "Downloaded {} bytes in {:.3}s at {:.2} Mbps",
        result.received_bytes, result.duration_seconds, result.throughput_mbps
    );
    Ok(())
}

pub async fn cmd_upload(target: &Target, size: u64) -> Result<()> {
    let resp = upload(target, size).await?;
    println!(
        "Uploaded {} bytes in {:.3}s at {:.2} Mbps (server measured)",
        resp.received_bytes, resp.duration_seconds, resp.calculated_mbps
    );
    Ok(())
}

/// Full test: latency, download, upload, provider. Submits the result when
/// a hardware id is given.
pub async fn cmd_run(target: &Target, size: u64, hardware: Option<u64>) -> Result<()> {
    let rtts = ping(target, PING_SAMPLES).await?;
    let latency_ms = mean(&rtts);
    let jitter_ms = jitter(&rtts);
    tokio::time::sleep(PHASE_GAP).await;
    let down = download_parallel(target, size, DOWNLOAD_STREAMS).await?;
    tokio::time::sleep(PHASE_GAP).await;
    let up = upload(target, size).await?;
    let provider = network::fetch(target).await?;

    println!("═══════════════════════════════════════");
    println!("  Speed Test");
    println!("═══════════════════════════════════════");
    println!("  Latency   : {:.2} ms", latency_ms);
    println!("  Jitter    : {:.2} ms", jitter_ms);
    println!("  Download  : {:.2} Mbps", down.throughput_mbps);
    println!("  Upload    : {:.2} Mbps", up.calculated_mbps);
    println!("  ISP       : {}", provider.isp);
    println!("  Satellite : {}", if provider.is_starlink { "yes" } else { "no" });

    let Some(hardware) = hardware else {
        return Ok(());
    };
    if target.user.is_none() {
        bail!("--user is required to submit a result");
    }

    let req = SubmitRequest {
        hardware,
        download_mbps: down.throughput_mbps,
        upload_mbps: up.calculated_mbps,
        latency_ms,
        jitter_ms,
    };
    let saved: SubmitResponse = post_json_body(target, "/results", &req).await?;
    println!(
        "  Recorded  : result {} ({}, satellite: {})",
        saved.id, saved.isp_name, saved.is_starlink
    );
    Ok(())
}
