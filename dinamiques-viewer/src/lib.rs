//! dinamiques-viewer library - catalog HTTP service
//!
//! Serves the listing/detail API consumed by the API-backed catalog, plus a
//! session endpoint returning the filtered, sorted and paginated view with
//! its cascading dropdowns.

use axum::Router;
use dinamiques_common::debounce::SearchDebouncer;
use dinamiques_common::favorites::KeyValueStore;
use dinamiques_common::source::DataSource;
use dinamiques_common::Catalog;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The catalog session; loads only hold the lock to begin and finish
    pub catalog: Arc<RwLock<Catalog>>,
    pub source: Arc<dyn DataSource>,
    pub favorites_store: Arc<dyn KeyValueStore>,
    /// Free-text input; settled queries are applied to `catalog`
    pub search: Arc<SearchDebouncer>,
    /// Most dynamics one listing request may return
    pub result_cap: usize,
}

impl AppState {
    /// Must be called from within a tokio runtime
    pub fn new(
        catalog: Catalog,
        source: Arc<dyn DataSource>,
        favorites_store: Arc<dyn KeyValueStore>,
        result_cap: usize,
        search_debounce: Duration,
    ) -> Self {
        let catalog = Arc::new(RwLock::new(catalog));
        let search = spawn_search_worker(Arc::clone(&catalog), search_debounce);
        Self {
            catalog,
            source,
            favorites_store,
            search: Arc::new(search),
            result_cap: result_cap.max(1),
        }
    }
}

/// Apply each settled search query to the session
fn spawn_search_worker(catalog: Arc<RwLock<Catalog>>, quiet: Duration) -> SearchDebouncer {
    let (debouncer, mut settled) = SearchDebouncer::spawn(quiet);
    tokio::spawn(async move {
        while let Some(query) = settled.recv().await {
            debug!(query = %query, "Applying search");
            catalog.write().await.set_search(query);
        }
    });
    debouncer
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/api/dinamiques", get(api::list_dynamics))
        .route("/api/dinamica/:id", get(api::get_dynamic))
        .route("/api/stats", get(api::get_stats))
        .route("/api/models", get(api::get_models))
        .route("/api/tipus", get(api::get_types))
        .route("/api/catalog", get(api::get_catalog).post(api::query_catalog))
        .route("/api/catalog/more", post(api::load_more))
        .route("/api/catalog/search", post(api::submit_search))
        .route("/api/favorites", get(api::get_favorites))
        .route("/api/favorites/:id/toggle", post(api::toggle_favorite))
        .route("/api/compare", get(api::get_compare).delete(api::clear_compare))
        .route("/api/compare/:id", post(api::add_compare).delete(api::remove_compare))
        .route("/api/reload", post(api::reload));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
