//! Ordered search stages. Each stage either settles the search with a
//! terminal [`SearchResult`] or lets the next one run.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::error::NetworkError;
use crate::fetch::{Fetch, FetchResult};
use crate::result::SearchResult;
use crate::state::SearchState;

pub mod fallback;
pub mod html_analysis;
pub mod url_pattern;

pub use fallback::FallbackStrategy;
pub use html_analysis::HtmlAnalysisStrategy;
pub use url_pattern::UrlPatternStrategy;

/// Read-only inputs shared by every stage of one run.
pub struct SearchContext<'a> {
    pub target: Url,
    pub fetcher: &'a dyn Fetch,
    pub config: &'a DiscoveryConfig,
    pub started: Instant,
}

impl SearchContext<'_> {
    pub fn budget_exhausted(&self) -> bool {
        self.started.elapsed() >= self.config.time_budget()
    }

    /// Every request of a run goes through here so the courtesy delay
    /// follows this run's config, not the fetcher's.
    pub async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchResult, NetworkError> {
        let delay = self.config.request_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.fetcher.get(url, timeout).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Found(SearchResult),
    Continue,
}

#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &SearchContext<'_>, state: &mut SearchState) -> StageOutcome;
}

/// URL patterns, then homepage analysis, then fallback.
pub fn default_pipeline() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(UrlPatternStrategy),
        Box::new(HtmlAnalysisStrategy),
        Box::new(FallbackStrategy),
    ]
}
