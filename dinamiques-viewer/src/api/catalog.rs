//! Catalog session endpoints
//!
//! The service keeps a single catalog session. Posting a query replaces its
//! filters and sort key, which resets stale dropdown selections and the
//! visible window; "more" grows the window by one page. Typed search text
//! goes through the debouncer and lands in the session once it settles.

use axum::{extract::State, http::StatusCode, Json};
use dinamiques_common::stats::{distinct_categories, distinct_models, distinct_types};
use dinamiques_common::{Catalog, CatalogView, FilterState, SortKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use crate::AppState;

/// Body of POST /api/catalog
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub filters: FilterState,
    #[serde(default)]
    pub sort: SortKey,
    /// Pages of results to show
    #[serde(default = "first_page")]
    pub page: usize,
}

/// Body of POST /api/catalog/search
#[derive(Debug, Deserialize)]
pub struct SearchInput {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct SearchAccepted {
    pub pending: String,
}

fn first_page() -> usize {
    1
}

#[derive(Debug, Serialize)]
struct CatalogResponse<'a> {
    #[serde(flatten)]
    view: CatalogView<'a>,
    models: Vec<String>,
    types: Vec<String>,
    categories: Vec<String>,
    favorites: &'a [i64],
}

fn render(catalog: &Catalog) -> ApiResult<Json<Value>> {
    let records = catalog.records();
    let response = CatalogResponse {
        view: catalog.view(),
        models: distinct_models(records),
        types: distinct_types(records),
        categories: distinct_categories(records),
        favorites: catalog.favorites().ids(),
    };
    Ok(Json(serde_json::to_value(response)?))
}

/// GET /api/catalog
pub async fn get_catalog(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    render(&*state.catalog.read().await)
}

/// POST /api/catalog
pub async fn query_catalog(
    State(state): State<AppState>,
    Json(query): Json<CatalogQuery>,
) -> ApiResult<Json<Value>> {
    let mut catalog = state.catalog.write().await;
    if catalog.sort() != query.sort {
        catalog.set_sort(query.sort);
    }
    catalog.set_filters(query.filters);
    catalog.show_pages(query.page);
    render(&catalog)
}

/// POST /api/catalog/more
pub async fn load_more(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut catalog = state.catalog.write().await;
    catalog.load_more();
    render(&catalog)
}

/// POST /api/catalog/search
pub async fn submit_search(
    State(state): State<AppState>,
    Json(input): Json<SearchInput>,
) -> ApiResult<(StatusCode, Json<SearchAccepted>)> {
    if !state.search.submit(input.search.clone()) {
        return Err(ApiError::Internal("search worker stopped".into()));
    }
    Ok((StatusCode::ACCEPTED, Json(SearchAccepted { pending: input.search })))
}
