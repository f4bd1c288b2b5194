//! Health check endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Always 200 while the process is up; `store` reports database reachability.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = if state.intake.store_healthy().await {
        "ok"
    } else {
        "unavailable"
    };

    Json(json!({
        "status": "ok",
        "service": "herald-api",
        "version": env!("CARGO_PKG_VERSION"),
        "store": store
    }))
}
