// =============================================================================
// REST API Endpoints — Axum 0.8
// =============================================================================
//
// All endpoints live under `/api/v1/`. Public endpoints (health) require no
// authentication. All other endpoints require a valid Bearer token checked via
// the `AuthBearer` extractor.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::types::ScanMode;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        // ── Authenticated ───────────────────────────────────────────
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/alerts", get(alerts))
        .route("/api/v1/report", get(last_report))
        .route("/api/v1/config", get(config_snapshot))
        .route("/api/v1/control/pause", post(control_pause))
        .route("/api/v1/control/resume", post(control_resume))
        .route("/api/v1/scan", post(trigger_scan))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Snapshots (authenticated)
// =============================================================================

async fn full_state(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

async fn alerts(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ring = state.recent_alerts.read();
    Json(ring.iter().cloned().collect::<Vec<_>>())
}

async fn last_report(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.last_report.read().clone() {
        Some(report) => Json(serde_json::to_value(report).unwrap_or_default()).into_response(),
        None => {
            let body = serde_json::json!({ "report": null, "message": "No scan completed yet" });
            Json(body).into_response()
        }
    }
}

async fn config_snapshot(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let config = state.runtime_config.read().clone();
    Json(config)
}

// =============================================================================
// Control endpoints (authenticated)
// =============================================================================

#[derive(Serialize)]
struct ControlResponse {
    scan_mode: String,
    message: String,
}

async fn control_pause(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    {
        let mut config = state.runtime_config.write();
        config.scan_mode = ScanMode::Paused;
    }
    state.increment_version();
    info!("Scanning PAUSED via API");

    Json(ControlResponse {
        scan_mode: "Paused".to_string(),
        message: "Scheduled scans paused".to_string(),
    })
}

async fn control_resume(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    {
        let mut config = state.runtime_config.write();
        config.scan_mode = ScanMode::Active;
    }
    state.increment_version();
    info!("Scanning RESUMED via API");

    Json(ControlResponse {
        scan_mode: "Active".to_string(),
        message: "Scheduled scans resumed".to_string(),
    })
}

// =============================================================================
// Manual scan trigger (authenticated)
// =============================================================================

async fn trigger_scan(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.scan_trigger.try_send(()) {
        Ok(()) => {
            info!("Manual scan requested via API");
            Json(serde_json::json!({ "message": "Scan requested" }))
        }
        Err(_) => {
            // A trigger is already queued or the loop is gone; either way the
            // request is a no-op.
            warn!("Manual scan request dropped (already pending)");
            Json(serde_json::json!({ "message": "Scan already pending" }))
        }
    }
}
