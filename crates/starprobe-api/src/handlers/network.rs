//! /network-info handler — provider classification for the caller.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiState, ClientAddr};

#[derive(Serialize, Deserialize)]
pub struct NetworkInfoResponse {
    pub ip: String,
    pub isp: String,
    pub is_starlink: bool,
    pub details: String,
}

pub async fn handle_network_info(
    State(state): State<ApiState>,
    ClientAddr(ip): ClientAddr,
) -> Json<NetworkInfoResponse> {
    let info = state.classifier.classify(&ip).await;
    Json(NetworkInfoResponse {
        isp: info.isp_name().to_string(),
        is_starlink: info.is_satellite_isp(),
        details: info.details(),
        ip,
    })
}
