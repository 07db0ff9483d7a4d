//! /ping, /download, /upload handlers — the speed test data path.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use starprobe_services::{DownloadStreamer, UploadConsumer};

use super::ApiState;

// ── /ping ─────────────────────────────────────────────────────────────────────

pub async fn handle_ping() -> StatusCode {
    StatusCode::NO_CONTENT
}

// ── /download ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DownloadParams {
    pub size: Option<String>,
}

/// Parse the `size` parameter. Absent or non-numeric values fall back to
/// `default`; integers outside `i64` saturate.
fn parse_size(raw: Option<&str>, default: u64) -> i64 {
    let default = i64::try_from(default).unwrap_or(i64::MAX);
    let Some(raw) = raw.map(str::trim) else {
        return default;
    };
    match raw.parse::<i64>() {
        Ok(n) => n,
        Err(_) => {
            let (negative, digits) = match raw.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, raw.strip_prefix('+').unwrap_or(raw)),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                default
            } else if negative {
                i64::MIN
            } else {
                i64::MAX
            }
        }
    }
}

pub async fn handle_download(
    State(state): State<ApiState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, (StatusCode, String)> {
    let m = &state.config.measurement;
    let requested = parse_size(params.size.as_deref(), m.default_download_bytes);

    let streamer =
        DownloadStreamer::for_request(requested, m.chunk_size_bytes, m.max_download_bytes)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let total = streamer.total_bytes();
    tracing::debug!(requested, total, "download started");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, total.to_string())
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .body(Body::from_stream(streamer.into_stream()))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

// ── /upload ───────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct UploadResponse {
    pub received_bytes: u64,
    pub duration_seconds: f64,
    pub calculated_mbps: f64,
}

pub async fn handle_upload(
    State(state): State<ApiState>,
    body: Body,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let consumer = UploadConsumer::new(state.config.measurement.upload_read_bytes);
    let result = consumer
        .consume_stream(body.into_data_stream())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "upload aborted");
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;

    tracing::info!(
        bytes = result.received_bytes,
        seconds = result.duration_seconds,
        mbps = result.throughput_mbps,
        "upload measured"
    );

    Ok(Json(UploadResponse {
        received_bytes: result.received_bytes,
        duration_seconds: result.duration_seconds,
        calculated_mbps: result.throughput_mbps,
    }))
}
