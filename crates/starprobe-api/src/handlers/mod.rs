//! HTTP API handlers — speed test endpoints and owned records as JSON.

pub mod hardware;
pub mod measure;
pub mod network;
pub mod results;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};

use starprobe_core::config::StarprobeConfig;
use starprobe_core::{Actor, MeasureError};
use starprobe_services::{ProviderClassifier, RecordError, RecordStore};

/// Header carrying the authenticated user id, set by the fronting proxy.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<StarprobeConfig>,
    pub classifier: ProviderClassifier,
    pub records: RecordStore,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// The authenticated caller. Rejects with 401 when the identity header is
/// missing or malformed.
pub struct Caller(pub Actor);

impl FromRequestParts<ApiState> for Caller {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let user: u64 = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ))?;
        Ok(Caller(Actor {
            user: starprobe_core::UserId(user),
            is_admin: state.config.is_admin(user),
        }))
    }
}

/// Public address of the caller: first `X-Forwarded-For` entry, else the
/// transport peer. Empty when neither is known.
pub struct ClientAddr(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientAddr {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientAddr(client_ip(&parts.headers, peer).unwrap_or_default()))
    }
}

fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    match forwarded {
        Some(ip) => Some(ip.to_string()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}

/// Map a record-layer error to a response.
fn record_error(e: RecordError) -> (StatusCode, String) {
    let status = match &e {
        RecordError::HardwareNotFound(_) | RecordError::ResultNotFound(_) => StatusCode::NOT_FOUND,
        RecordError::DuplicateSerial(_) => StatusCode::CONFLICT,
        RecordError::Measure(MeasureError::Unauthorized) => StatusCode::FORBIDDEN,
        RecordError::Measure(MeasureError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
        RecordError::Measure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

// Re-export handler functions for use in router setup.
pub use hardware::{handle_hardware_get, handle_hardware_list, handle_hardware_register};
pub use measure::{handle_download, handle_ping, handle_upload};
pub use network::handle_network_info;
pub use results::{handle_results_get, handle_results_list, handle_results_submit};
