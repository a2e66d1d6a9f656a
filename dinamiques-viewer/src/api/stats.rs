//! Dataset statistics endpoints

use axum::{extract::State, Json};
use dinamiques_common::stats::{dataset_stats, model_counts, type_counts, DatasetStats, NamedCount};

use crate::AppState;

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<DatasetStats> {
    let catalog = state.catalog.read().await;
    Json(dataset_stats(catalog.records(), catalog.normalizer()))
}

/// GET /api/models
pub async fn get_models(State(state): State<AppState>) -> Json<Vec<NamedCount>> {
    Json(model_counts(state.catalog.read().await.records()))
}

/// GET /api/tipus
pub async fn get_types(State(state): State<AppState>) -> Json<Vec<NamedCount>> {
    Json(type_counts(state.catalog.read().await.records()))
}
