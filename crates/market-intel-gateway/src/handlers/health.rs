//! Gateway liveness
//!
//! GET /health - always 200 while the process is alive.  Says nothing about
//! the analytics backend; probing that is the forwarder's job.

use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use market_intel_kernel::timestamp;
use serde_json::json;

/// Service name reported by the liveness document.
pub const SERVICE_NAME: &str = "market-intel-gateway";

/// GET /health - liveness probe
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "timestamp": timestamp(Utc::now()),
        })),
    )
}
