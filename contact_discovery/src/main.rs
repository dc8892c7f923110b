mod app_state;
mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{fmt, EnvFilter};

use contact_discovery::fetch::make_browserish_client;
use contact_discovery::{AppConfig, ContactDiscoverer, Fetch, HttpFetcher};

use crate::app_state::AppState;
use crate::handlers::{batch::discover_batch, detect::detect_form_url, discover::discover};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("contact_discovery=info,tower_http=info"));
    fmt().with_env_filter(filter).init();

    let cfg = AppConfig::from_env()?;
    tracing::info!(?cfg, "config loaded");

    let http = make_browserish_client()?;
    let fetcher: Arc<dyn Fetch> = Arc::new(HttpFetcher::new(http));
    let state = Arc::new(AppState {
        discoverer: ContactDiscoverer::new(fetcher.clone(), cfg.discovery.clone()),
        fetcher,
        batch: cfg.batch.clone(),
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/discover", post(discover))
        .route("/discover/batch", post(discover_batch))
        .route("/detect-form", post(detect_form_url))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", cfg.bind);
    let listener = tokio::net::TcpListener::bind(cfg.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}
