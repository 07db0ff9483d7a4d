//! /hardware handlers — customer hardware owned by the caller.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use starprobe_core::{authorize, HardwareRecord, UserId};
use starprobe_services::{check_access, RecordError};

use super::{record_error, ApiState, Caller};

#[derive(Serialize, Deserialize)]
pub struct HardwareView {
    pub id: u64,
    pub serial: String,
    pub nickname: String,
    pub owner: u64,
}

impl From<&HardwareRecord> for HardwareView {
    fn from(hw: &HardwareRecord) -> Self {
        Self {
            id: hw.id,
            serial: hw.serial.clone(),
            nickname: hw.nickname.clone(),
            owner: hw.owner.0,
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub serial: String,
    #[serde(default)]
    pub nickname: String,
    /// Honoured for administrators only; everyone else registers for
    /// themselves.
    pub owner: Option<u64>,
}

pub async fn handle_hardware_register(
    State(state): State<ApiState>,
    Caller(actor): Caller,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<HardwareView>), (StatusCode, String)> {
    let serial = req.serial.trim();
    if serial.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "serial is required".to_string()));
    }
    let owner = match req.owner {
        Some(id) if actor.is_admin => UserId(id),
        _ => actor.user,
    };
    let hw = state
        .records
        .register_hardware(serial, req.nickname.trim(), owner)
        .map_err(record_error)?;
    Ok((StatusCode::CREATED, Json(HardwareView::from(&*hw))))
}

#[derive(Serialize, Deserialize)]
pub struct HardwareListResponse {
    pub hardware: Vec<HardwareView>,
}

pub async fn handle_hardware_list(
    State(state): State<ApiState>,
    Caller(actor): Caller,
) -> Json<HardwareListResponse> {
    let hardware = state
        .records
        .hardware_visible_to(&actor)
        .iter()
        .map(|hw| HardwareView::from(&**hw))
        .collect();
    Json(HardwareListResponse { hardware })
}

pub async fn handle_hardware_get(
    State(state): State<ApiState>,
    Caller(actor): Caller,
    Path(id): Path<u64>,
) -> Result<Json<HardwareView>, (StatusCode, String)> {
    let hw = state
        .records
        .hardware(id)
        .ok_or_else(|| record_error(RecordError::HardwareNotFound(id)))?;
    check_access(&actor, authorize(&actor, &*hw))
        .map_err(|e| record_error(e.into()))?;
    Ok(Json(HardwareView::from(&*hw)))
}
