use async_trait::async_trait;
use tracing::info;

use crate::result::{SearchMethod, SearchResult};
use crate::state::SearchState;

use super::{SearchContext, StageOutcome, Strategy};

/// Last resort: the best URL that answered with a real page during probing.
pub struct FallbackStrategy;

#[async_trait]
impl Strategy for FallbackStrategy {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn run(&self, ctx: &SearchContext<'_>, state: &mut SearchState) -> StageOutcome {
        let Some(sel) = state.select_fallback() else {
            info!(site = %ctx.target, "nothing to fall back on");
            return StageOutcome::Found(SearchResult::failure(SearchMethod::NotFound));
        };

        let method = if sel.is_high_confidence() {
            SearchMethod::FinalFallbackHighConfidence
        } else {
            SearchMethod::FinalFallbackLowConfidence
        };
        info!(url = %sel.url, confidence = sel.confidence, %method, "fallback selected");

        let mut keywords = vec![sel.pattern_matched.clone()];
        if let Some(p) = sel.fallback_pattern {
            keywords.push(p.to_string());
        }
        StageOutcome::Found(SearchResult::found(
            sel.url.clone(),
            Some(sel.url),
            keywords,
            method,
        ))
    }
}
