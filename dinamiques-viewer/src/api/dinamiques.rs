//! Listing and detail endpoints
//!
//! The listing filters on the coarse dimensions only (track, model,
//! category, type, free text) and returns the newest dynamics first, one
//! page of at most `limit` records at a time.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use dinamiques_common::curriculum::Track;
use dinamiques_common::filter::{apply_filters, FilterContext};
use dinamiques_common::pagination::page_slice;
use dinamiques_common::sort::{sort_records, SortKey};
use dinamiques_common::{Dynamic, FilterState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters for GET /api/dinamiques
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub target: Option<String>,
    pub model: Option<String>,
    pub categoria: Option<String>,
    pub tipus: Option<String>,
    pub search: Option<String>,
    /// Page size, capped by the configured result cap
    pub limit: Option<usize>,
    /// 1-indexed page; out-of-range pages are clamped
    pub page: Option<usize>,
}

fn selection(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
}

impl ListingQuery {
    fn into_filters(self) -> ApiResult<FilterState> {
        let track = selection(self.target)
            .map(|t| t.parse::<Track>())
            .transpose()
            .map_err(ApiError::BadRequest)?;
        Ok(FilterState {
            track,
            model: selection(self.model),
            category: selection(self.categoria),
            activity_type: selection(self.tipus),
            search: self.search.unwrap_or_default(),
            ..FilterState::default()
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub dinamiques: Vec<Dynamic>,
    /// Matches before paging
    pub total: usize,
}

/// GET /api/dinamiques
pub async fn list_dynamics(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<ListingResponse>> {
    let limit = query.limit.unwrap_or(state.result_cap).clamp(1, state.result_cap);
    let page = query.page.unwrap_or(1);
    let filters = query.into_filters()?;

    let catalog = state.catalog.read().await;
    let ctx = FilterContext::new(catalog.favorites(), catalog.quality_scale());
    let mut matches = apply_filters(catalog.records(), &filters, ctx);
    sort_records(&mut matches, SortKey::Recent);

    let total = matches.len();
    let dinamiques: Vec<Dynamic> = page_slice(&matches, page, limit).iter().copied().cloned().collect();
    debug!(total, page, returned = dinamiques.len(), "Listing served");

    Ok(Json(ListingResponse { dinamiques, total }))
}

/// GET /api/dinamica/:id
///
/// Served from the loaded snapshot, falling back to the source for records
/// the snapshot does not hold.
pub async fn get_dynamic(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Dynamic>> {
    if let Some(found) = state.catalog.read().await.get(id).cloned() {
        return Ok(Json(found));
    }
    let detail = state.source.fetch_detail(id).await?;
    Ok(Json(detail))
}
