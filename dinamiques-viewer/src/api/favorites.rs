//! Favorites and comparison endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use super::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub id: i64,
    pub favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub ids: Vec<i64>,
}

/// GET /api/favorites
pub async fn get_favorites(State(state): State<AppState>) -> Json<FavoritesResponse> {
    let catalog = state.catalog.read().await;
    Json(FavoritesResponse {
        favorites: catalog.favorites().ids().to_vec(),
    })
}

/// POST /api/favorites/:id/toggle
///
/// Unknown ids are rejected so the stored list only names loaded dynamics.
pub async fn toggle_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<ToggleResponse>> {
    let mut catalog = state.catalog.write().await;
    if catalog.get(id).is_none() && !catalog.favorites().contains(id) {
        return Err(ApiError::NotFound(format!("dynamic {}", id)));
    }
    let favorite = catalog.toggle_favorite(id, state.favorites_store.as_ref())?;
    info!(id, favorite, "Favorite toggled");
    Ok(Json(ToggleResponse { id, favorite }))
}

fn compare_response(ids: &[i64]) -> Json<CompareResponse> {
    Json(CompareResponse { ids: ids.to_vec() })
}

/// GET /api/compare
pub async fn get_compare(State(state): State<AppState>) -> Json<CompareResponse> {
    compare_response(state.catalog.read().await.compare().ids())
}

/// POST /api/compare/:id
pub async fn add_compare(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<CompareResponse>> {
    let mut catalog = state.catalog.write().await;
    if catalog.get(id).is_none() {
        return Err(ApiError::NotFound(format!("dynamic {}", id)));
    }
    catalog
        .compare_mut()
        .add(id)
        .map_err(|e| ApiError::Conflict(e.to_string()))?;
    Ok(compare_response(catalog.compare().ids()))
}

/// DELETE /api/compare/:id
pub async fn remove_compare(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<CompareResponse>> {
    let mut catalog = state.catalog.write().await;
    if !catalog.compare_mut().remove(id) {
        return Err(ApiError::NotFound(format!("dynamic {} is not being compared", id)));
    }
    Ok(compare_response(catalog.compare().ids()))
}

/// DELETE /api/compare
pub async fn clear_compare(State(state): State<AppState>) -> Json<CompareResponse> {
    let mut catalog = state.catalog.write().await;
    catalog.compare_mut().clear();
    compare_response(catalog.compare().ids())
}
