use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::error::NetworkErrorKind;
use crate::form_detect::{
    detect_form, find_google_form, find_valid_google_form, has_native_form, FormKind,
};
use crate::heuristics::{candidate_score, is_valid_page, pattern_urls};
use crate::result::{SearchMethod, SearchResult};
use crate::spa::{analyze_anchor_section, contact_anchor_urls};
use crate::state::{CandidateReason, SearchState};
use crate::text_utils::url_stem;

use super::{SearchContext, StageOutcome, Strategy};

/// HTTP statuses that mean anti-automation defences, not a missing path.
pub const BOT_BLOCK_STATUSES: &[u16] = &[403, 501];

/// Probes the well-known contact paths under the target, one at a time.
pub struct UrlPatternStrategy;

#[async_trait]
impl Strategy for UrlPatternStrategy {
    fn name(&self) -> &'static str {
        "url_pattern"
    }

    #[instrument(name = "url_pattern", skip_all, fields(site = %ctx.target))]
    async fn run(&self, ctx: &SearchContext<'_>, state: &mut SearchState) -> StageOutcome {
        // pages reached so far, keyed by where each request landed
        let mut landed: Vec<String> = Vec::new();

        for (url, pattern) in pattern_urls(&ctx.target) {
            if ctx.budget_exhausted() {
                info!(pages = landed.len(), "time budget exhausted");
                break;
            }

            let res = match ctx.fetch(&url, ctx.config.probe_timeout()).await {
                Ok(r) => r,
                Err(e) if e.kind == NetworkErrorKind::Dns => {
                    info!(%url, error = %e, "dns failure, aborting");
                    return StageOutcome::Found(SearchResult::failure(SearchMethod::DnsError));
                }
                Err(e) => {
                    debug!(%url, kind = %e.kind, "request failed");
                    continue;
                }
            };

            if BOT_BLOCK_STATUSES.contains(&res.status) {
                info!(%url, status = res.status, "bot blocked");
                return StageOutcome::Found(SearchResult::failure(SearchMethod::BotBlocked));
            }
            if !res.is_success() || !res.is_html_like() {
                debug!(%url, status = res.status, "skip");
                continue;
            }

            // `/contact` redirecting to `/contact/` is one page, not two
            let page_key = url_stem(&res.final_url);
            if landed.contains(&page_key) {
                debug!(%url, final_url = %res.final_url, "same page as an earlier path");
                continue;
            }
            landed.push(page_key);

            let html = res.text();
            if state.detect_repeated_content(&landed, &html) {
                debug!(%url, "same markup under distinct pages");
                if state.begin_spa_anchor_attempt() {
                    for anchor in contact_anchor_urls(&html, &ctx.target) {
                        let r = analyze_anchor_section(&html, &anchor, &ctx.target);
                        if r.is_found() {
                            info!(%anchor, "contact section confirmed in spa shell");
                            return StageOutcome::Found(r);
                        }
                    }
                }
                continue;
            }

            if !is_valid_page(&html) {
                debug!(%url, "invalid page");
                continue;
            }
            state.add_valid_url(url.clone(), pattern);

            if has_native_form(&html) {
                info!(%url, "native form");
                state.mark_form_confirmed(&url);
                return StageOutcome::Found(SearchResult::found(
                    url.clone(),
                    Some(url),
                    vec![pattern.to_string(), "form".into()],
                    SearchMethod::ContactFormPrioritySearch,
                ));
            }

            if let Some(g) = find_valid_google_form(&html) {
                if let Ok(form_url) = url::Url::parse(&g.url) {
                    info!(%url, %form_url, "google form");
                    state.mark_form_confirmed(&url);
                    return StageOutcome::Found(SearchResult::found(
                        url,
                        Some(form_url),
                        vec![pattern.to_string(), "google_forms".into()],
                        SearchMethod::GoogleFormsPrioritySearch,
                    ));
                }
            }

            let reason = match detect_form(&html).kind {
                Some(kind @ (FormKind::ScriptRecaptcha | FormKind::EmbeddedThirdparty)) => {
                    CandidateReason::DynamicForm(kind)
                }
                _ if find_google_form(&html).is_some() => CandidateReason::GoogleFormRejected,
                _ => CandidateReason::NoStructuredForm,
            };
            let score = candidate_score(&url, &html, reason);
            debug!(%url, reason = reason.as_str(), score, "candidate");
            state.add_candidate(url, reason, score);
        }

        StageOutcome::Continue
    }
}
