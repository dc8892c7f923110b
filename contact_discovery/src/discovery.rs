use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::DiscoveryConfig;
use crate::fetch::Fetch;
use crate::heuristics::is_social_media;
use crate::result::{SearchMethod, SearchResult};
use crate::state::{Candidate, SearchState, ValidUrl};
use crate::strategy::{default_pipeline, SearchContext, StageOutcome, Strategy};
use crate::text_utils::{origin_root, parse_target_url};

/// A result together with what the run saw on the way.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub target: String,
    pub result: SearchResult,
    /// Stage that produced the result; `None` when a pre-check ended the run.
    pub stage: Option<&'static str>,
    pub candidates: Vec<Candidate>,
    pub valid_urls: Vec<ValidUrl>,
    pub elapsed_ms: u64,
}

/// Finds the contact page of one site per call. Cheap to share; every call
/// owns a fresh [`SearchState`].
pub struct ContactDiscoverer {
    fetcher: Arc<dyn Fetch>,
    config: DiscoveryConfig,
    pipeline: Vec<Box<dyn Strategy>>,
}

impl ContactDiscoverer {
    pub fn new(fetcher: Arc<dyn Fetch>, config: DiscoveryConfig) -> Self {
        Self::with_pipeline(fetcher, config, default_pipeline())
    }

    pub fn with_pipeline(
        fetcher: Arc<dyn Fetch>,
        config: DiscoveryConfig,
        pipeline: Vec<Box<dyn Strategy>>,
    ) -> Self {
        Self {
            fetcher,
            config,
            pipeline,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Same fetcher, different tunables. Timeouts, budget and request
    /// delay all come from `config` for runs of the returned engine.
    pub fn with_config(&self, config: DiscoveryConfig) -> Self {
        Self::new(self.fetcher.clone(), config)
    }

    pub async fn discover(&self, url: &str) -> SearchResult {
        self.discover_report(url).await.result
    }

    #[instrument(name = "discover", skip_all, fields(site = %url))]
    pub async fn discover_report(&self, url: &str) -> DiscoveryReport {
        let t0 = Instant::now();
        let mut state = SearchState::new();
        let (result, stage) = self.run(url, &mut state).await;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        info!(
            method = %result.search_method,
            contact_url = ?result.contact_url.as_ref().map(|u| u.as_str()),
            stage,
            elapsed_ms,
            "discover done"
        );

        DiscoveryReport {
            target: url.to_string(),
            result,
            stage,
            candidates: state.candidates().to_vec(),
            valid_urls: state.valid_urls().to_vec(),
            elapsed_ms,
        }
    }

    async fn run(
        &self,
        raw: &str,
        state: &mut SearchState,
    ) -> (SearchResult, Option<&'static str>) {
        let Some(target) = parse_target_url(raw) else {
            warn!("invalid url");
            return (SearchResult::failure(SearchMethod::InvalidUrl), None);
        };

        if is_social_media(&target) {
            info!(%target, "social media site");
            return (SearchResult::failure(SearchMethod::SnsNotSupported), None);
        }

        let root = origin_root(&target);
        let mut ctx = SearchContext {
            target,
            fetcher: self.fetcher.as_ref(),
            config: &self.config,
            started: Instant::now(),
        };

        if let Err(e) = ctx.fetch(&root, self.config.liveness_timeout()).await {
            warn!(%root, kind = %e.kind, error = %e, "liveness check failed");
            return (SearchResult::failure(SearchMethod::from_liveness_error(e.kind)), None);
        }
        // budget covers the pipeline only
        ctx.started = Instant::now();

        for strategy in &self.pipeline {
            let t = Instant::now();
            let outcome = strategy.run(&ctx, state).await;
            let elapsed_ms = t.elapsed().as_millis() as u64;
            match outcome {
                StageOutcome::Found(result) => {
                    debug!(stage = strategy.name(), elapsed_ms, "stage settled");
                    return (result, Some(strategy.name()));
                }
                StageOutcome::Continue => {
                    debug!(stage = strategy.name(), elapsed_ms, "stage passed");
                }
            }
        }

        (SearchResult::failure(SearchMethod::NotFound), None)
    }
}
