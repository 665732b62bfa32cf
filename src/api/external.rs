use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Deserialize)]
pub struct OmdbSearchQuery {
    pub query: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Deserialize)]
pub struct OmdbDetailsQuery {
    pub id: String,
}

#[derive(Deserialize)]
pub struct BookSearchQuery {
    pub query: String,
}

/// GET /external/search/omdb
pub async fn search_omdb(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OmdbSearchQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if params.query.trim().is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }
    if !state.omdb.is_configured() {
        return Err(ApiError::ConfigurationError(
            "OMDb API key not configured".to_string(),
        ));
    }

    let result = state
        .omdb
        .search(&params.query, params.media_type.as_deref())
        .await
        .map_err(|e| ApiError::omdb_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /external/search/omdb-details
pub async fn omdb_details(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OmdbDetailsQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if params.id.trim().is_empty() {
        return Err(ApiError::validation("id must not be empty"));
    }
    if !state.omdb.is_configured() {
        return Err(ApiError::ConfigurationError(
            "OMDb API key not configured".to_string(),
        ));
    }

    let result = state
        .omdb
        .details(&params.id)
        .await
        .map_err(|e| ApiError::omdb_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /external/search/book
pub async fn search_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookSearchQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if params.query.trim().is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }

    let result = state
        .google_books
        .search(&params.query)
        .await
        .map_err(|e| ApiError::google_books_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(result)))
}
