//! Health check endpoints
//!
//! - /health, /healthz - Liveness probe (is the service running?)
//! - /version          - Build information for deployment verification

use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    pub status: &'static str,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub timestamp: String,
    /// "development" or "production"
    pub mode: &'static str,
    /// Credential store backend ("mongodb" or "memory")
    pub store: &'static str,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        store: state.store_backend.as_str(),
    }
}

/// Handle liveness probe (/health, /healthz)
///
/// Always 200 while the process is serving. A database outage shows up as
/// 503 on the auth routes, not here.
pub fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(&state))
}

/// Version information for deployment verification
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<BoxBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "gatehouse",
    };

    json_response(StatusCode::OK, &response)
}
