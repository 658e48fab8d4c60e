//! Notification handler

use axum::{extract::State, Json};

use crate::error::Result;
use crate::notifications::{self, NotificationRequest, NotificationResponse};
use crate::AppState;

/// POST /api/notifications
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<NotificationRequest>,
) -> Result<Json<NotificationResponse>> {
    let response = notifications::dispatch(&state.db, &state.cache, request).await?;
    Ok(Json(response))
}
