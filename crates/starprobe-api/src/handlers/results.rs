//! /results handlers — submitting and reading speed test results.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use starprobe_core::{authorize, SpeedTestRecord};
use starprobe_services::{
    check_access, record_result, RecordError, SubmittedMeasurement, DEFAULT_RESULT_LIMIT,
};

use super::{record_error, ApiState, Caller, ClientAddr};

#[derive(Serialize, Deserialize)]
pub struct ResultView {
    pub id: u64,
    pub hardware: Option<u64>,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: f64,
    pub jitter_ms: f64,
    pub isp_name: String,
    pub is_starlink: bool,
    pub client_ip: Option<String>,
    pub created_at: u64,
}

impl From<&SpeedTestRecord> for ResultView {
    fn from(r: &SpeedTestRecord) -> Self {
        Self {
            id: r.id,
            hardware: r.hardware.as_ref().map(|hw| hw.id),
            download_mbps: r.download_mbps,
            upload_mbps: r.upload_mbps,
            latency_ms: r.latency_ms,
            jitter_ms: r.jitter_ms,
            isp_name: r.isp_name.clone(),
            is_starlink: r.is_starlink,
            client_ip: r.client_ip.clone(),
            created_at: r.created_at,
        }
    }
}

// ── POST /results ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub hardware: u64,
    #[serde(flatten)]
    pub measured: SubmittedMeasurement,
}

pub async fn handle_results_submit(
    State(state): State<ApiState>,
    Caller(actor): Caller,
    ClientAddr(ip): ClientAddr,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<ResultView>), (StatusCode, String)> {
    let record = record_result(
        &state.records,
        &state.classifier,
        &actor,
        req.hardware,
        req.measured,
        &ip,
    )
    .await
    .map_err(record_error)?;
    Ok((StatusCode::CREATED, Json(ResultView::from(&record))))
}

// ── GET /results ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListParams {
    pub hardware: Option<u64>,
    pub limit: Option<String>,
}

/// `"all"` lifts the limit; anything unparsable falls back to the default.
fn parse_limit(raw: Option<&str>) -> Option<usize> {
    match raw.map(str::trim) {
        Some("all") => None,
        Some(n) => Some(n.parse().unwrap_or(DEFAULT_RESULT_LIMIT)),
        None => Some(DEFAULT_RESULT_LIMIT),
    }
}

#[derive(Serialize, Deserialize)]
pub struct ResultListResponse {
    pub results: Vec<ResultView>,
}

pub async fn handle_results_list(
    State(state): State<ApiState>,
    Caller(actor): Caller,
    Query(params): Query<ListParams>,
) -> Json<ResultListResponse> {
    let results = state
        .records
        .results_owned_by(actor.user, params.hardware, parse_limit(params.limit.as_deref()))
        .iter()
        .map(ResultView::from)
        .collect();
    Json(ResultListResponse { results })
}

// ── GET /results/{id} ─────────────────────────────────────────────────────────

pub async fn handle_results_get(
    State(state): State<ApiState>,
    Caller(actor): Caller,
    Path(id): Path<u64>,
) -> Result<Json<ResultView>, (StatusCode, String)> {
    let record = state
        .records
        .result(id)
        .ok_or_else(|| record_error(RecordError::ResultNotFound(id)))?;
    check_access(&actor, authorize(&actor, &record)).map_err(|e| record_error(e.into()))?;
    Ok(Json(ResultView::from(&record)))
}
