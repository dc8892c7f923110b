use std::sync::Arc;

use axum::{extract::State, Json};
use contact_discovery::{DiscoveryConfig, DiscoveryReport};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::app_state::AppState;

#[derive(Deserialize)]
pub struct DiscoverReq {
    url: String,
    // 省略時はサーバー設定
    #[serde(default)]
    config: Option<DiscoveryConfig>,
}

#[derive(Serialize)]
pub struct DiscoverResp {
    #[serde(flatten)]
    report: Option<DiscoveryReport>,
    note: Option<String>,
}

#[instrument(name = "discover_handler", skip(state, req), fields(url = %req.url))]
pub async fn discover(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DiscoverReq>,
) -> Json<DiscoverResp> {
    let report = match req.config {
        Some(cfg) => {
            if let Err(e) = cfg.validate() {
                warn!(error = %e, "rejected request config");
                return Json(DiscoverResp {
                    report: None,
                    note: Some(format!("invalid config: {e}")),
                });
            }
            state.discoverer.with_config(cfg).discover_report(&req.url).await
        }
        None => state.discoverer.discover_report(&req.url).await,
    };

    info!(
        method = %report.result.search_method,
        candidates = report.candidates.len(),
        valid_urls = report.valid_urls.len(),
        elapsed_ms = report.elapsed_ms,
        "discover handled"
    );
    Json(DiscoverResp {
        report: Some(report),
        note: None,
    })
}
