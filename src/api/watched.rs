use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::db::{WatchedItem, WatchedItemInput};
use crate::services::AuthenticatedUser;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /watched
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<WatchedItemInput>,
) -> Result<(StatusCode, Json<ApiResponse<WatchedItem>>), ApiError> {
    let item = state.watched_service.add(user.id, payload).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

/// PUT /watched/{id}
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    Json(payload): Json<WatchedItemInput>,
) -> Result<Json<ApiResponse<WatchedItem>>, ApiError> {
    let item = state.watched_service.update(user.id, id, payload).await?;

    Ok(Json(ApiResponse::success(item)))
}

/// DELETE /watched/{id}
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.watched_service.delete(user.id, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Item removed".to_string(),
    })))
}

/// GET /watched/{user_id}
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<WatchedItem>>>, ApiError> {
    let items = state.watched_service.list_for_user(user_id).await?;

    Ok(Json(ApiResponse::success(items)))
}
