//! Read access to stored notifications.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_engine::intake::NotificationDetail;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notifications/{id}", get(get_notification))
}

/// GET /api/notifications/:id — A notification record with its delivery logs.
async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationDetail>, AppError> {
    let detail = state.intake.notification(id).await?;
    Ok(Json(detail))
}
