use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use crate::store::migrate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/database", get(database_health))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.uptime_secs(),
        "catalog": { "opportunities": state.catalog().len() },
        "coach": { "mode": state.coach().mode() },
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Ready once migrations have run and the catalog is loaded.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let migrated = migrate::get_current_version(state.store())
        .map(|version| version >= migrate::latest_version())
        .unwrap_or(false);

    if migrated && !state.catalog().is_empty() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn database_health(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let probe = migrate::get_current_version(state.store());
    let latency_us = start.elapsed().as_micros() as u64;

    let (status, body) = match probe {
        Ok(schema_version) => (
            StatusCode::OK,
            serde_json::json!({
                "healthy": true,
                "latencyUs": latency_us,
                "schemaVersion": schema_version,
                "practiceItems": state.store().count_practice_items(),
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Database health probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "healthy": false, "latencyUs": latency_us }),
            )
        }
    };
    (status, Json(body))
}
