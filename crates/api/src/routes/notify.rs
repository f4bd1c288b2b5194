//! Notification intake route.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use herald_common::error::AppError;

use crate::state::AppState;

pub const SCHEDULED_MESSAGE: &str = "Notification has been scheduled.";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notify/", post(notify))
}

/// POST /api/notify/ — Accept a notification and schedule its delivery.
///
/// Responds 202 once at least one recipient has been handed to the dispatch
/// queue. Delivery itself happens later in the notifier.
async fn notify(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Unreadable notification request");
        AppError::field("non_field_errors", rejection.body_text())
    })?;

    let receipt = state.intake.submit(&payload).await?;

    tracing::info!(
        notification_id = %receipt.notification_id,
        email_units = receipt.email_units,
        telegram_units = receipt.telegram_units,
        "Notification accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": SCHEDULED_MESSAGE })),
    ))
}
