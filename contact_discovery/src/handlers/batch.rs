use std::sync::Arc;

use axum::{extract::State, Json};
use contact_discovery::batch::{run_batch, BatchEntry, BatchSummary};
use contact_discovery::BatchConfig;
use serde::Deserialize;
use tracing::instrument;

use crate::app_state::AppState;

#[derive(Deserialize)]
pub struct BatchReq {
    entries: Vec<BatchEntry>,
    #[serde(default)]
    batch: Option<BatchConfig>,
}

#[instrument(name = "discover_batch", skip(state, req), fields(entries = req.entries.len()))]
pub async fn discover_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchReq>,
) -> Json<BatchSummary> {
    let cfg = req.batch.unwrap_or_else(|| state.batch.clone());
    Json(run_batch(&state.discoverer, req.entries, &cfg).await)
}
