//! Dataset reload
//!
//! The fetch runs without holding the catalog lock and always asks for the
//! unfiltered set; the session filters locally. A reload that finishes after
//! a newer one was started is discarded rather than applied.

use axum::{extract::State, Json};
use dinamiques_common::{FilterState, LoadOutcome};
use serde::Serialize;
use tracing::info;

use super::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// `applied` or `superseded`
    pub outcome: &'static str,
    pub records: usize,
    pub generation: u64,
}

/// POST /api/reload
pub async fn reload(State(state): State<AppState>) -> ApiResult<Json<ReloadResponse>> {
    let ticket = state.catalog.write().await.begin_load();
    info!(generation = ticket.generation(), source = %state.source.describe(), "Reloading catalog");

    let result = state.source.load(&FilterState::default()).await;

    let mut catalog = state.catalog.write().await;
    let outcome = catalog.finish_load(ticket, result)?;
    let response = match outcome {
        LoadOutcome::Applied { records } => ReloadResponse {
            outcome: "applied",
            records,
            generation: ticket.generation(),
        },
        LoadOutcome::Superseded => ReloadResponse {
            outcome: "superseded",
            records: catalog.records().len(),
            generation: ticket.generation(),
        },
    };
    Ok(Json(response))
}
