use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::form_detect::{
    detect_form, embedded_form_provider, find_google_form, find_valid_google_form,
    is_valid_contact_form_with, FormKind,
};
use crate::keywords::{FOOTER_REGION_SELECTORS, NAVIGATION_REGION_SELECTORS};
use crate::purity::{calculate_purity, has_contact_keyword, LinkContext};
use crate::result::{SearchMethod, SearchResult};
use crate::spa::analyze_anchor_section;
use crate::state::SearchState;
use crate::text_utils::{origin_root, resolve_url};

use super::url_pattern::BOT_BLOCK_STATUSES;
use super::{SearchContext, StageOutcome, Strategy};

static SEL_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static NAV_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    NAVIGATION_REGION_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static FOOTER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    FOOTER_REGION_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

/// Best contact link found in the homepage's navigation or footer.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationLink {
    pub url: Url,
    pub text: String,
    pub score: i32,
    pub reasons: Vec<String>,
}

fn region_of(a: &ElementRef<'_>) -> Option<LinkContext> {
    let mut ctx = LinkContext::default();
    for node in a.ancestors() {
        let Some(el) = ElementRef::wrap(node) else { continue };
        if !ctx.in_navigation && NAV_SELECTORS.iter().any(|s| s.matches(&el)) {
            ctx.in_navigation = true;
        }
        if !ctx.in_footer && FOOTER_SELECTORS.iter().any(|s| s.matches(&el)) {
            ctx.in_footer = true;
        }
    }
    (ctx.in_navigation || ctx.in_footer).then_some(ctx)
}

/// Scores every same-site link inside a navigation or footer region and
/// returns the best one carrying a contact keyword. Ties keep the earlier link.
pub fn best_navigation_link(html: &str, base: &Url) -> Option<NavigationLink> {
    let doc = Html::parse_document(html);
    let mut best: Option<NavigationLink> = None;

    for a in doc.select(&SEL_LINK) {
        let Some(context) = region_of(&a) else { continue };
        let Some(href) = a.value().attr("href") else { continue };
        let Some(url) = resolve_url(base, href) else { continue };
        if url.host_str() != base.host_str() {
            continue;
        }
        let text = a.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !has_contact_keyword(&url, &text) {
            continue;
        }

        let purity = calculate_purity(&url, &text, Some(context));
        if best.as_ref().map_or(true, |b| purity.score > b.score) {
            best = Some(NavigationLink {
                url,
                text,
                score: purity.score,
                reasons: purity.reasons,
            });
        }
    }
    best
}

fn is_same_page_fragment(link: &Url, page: &Url) -> bool {
    if link.fragment().is_none() {
        return false;
    }
    let mut a = link.clone();
    a.set_fragment(None);
    let mut b = page.clone();
    b.set_fragment(None);
    a == b
}

/// Reads the homepage: direct Google Forms, then the strongest navigation
/// link, then an embedded third-party form on the homepage itself.
pub struct HtmlAnalysisStrategy;

#[async_trait]
impl Strategy for HtmlAnalysisStrategy {
    fn name(&self) -> &'static str {
        "html_analysis"
    }

    #[instrument(name = "html_analysis", skip_all, fields(site = %ctx.target))]
    async fn run(&self, ctx: &SearchContext<'_>, state: &mut SearchState) -> StageOutcome {
        let homepage = ctx.target.clone();
        let res = match ctx.fetch(&homepage, ctx.config.homepage_timeout()).await {
            Ok(r) => r,
            Err(e) => {
                warn!(%homepage, error = %e, "homepage fetch failed");
                let method = SearchMethod::from_network_error(e.kind);
                return StageOutcome::Found(SearchResult::failure(method));
            }
        };
        if BOT_BLOCK_STATUSES.contains(&res.status) {
            info!(%homepage, status = res.status, "bot blocked");
            return StageOutcome::Found(SearchResult::failure(SearchMethod::BotBlocked));
        }
        if !res.is_success() {
            debug!(%homepage, status = res.status, "homepage not usable");
            return StageOutcome::Continue;
        }

        let html = res.text();
        // relative links resolve against where redirects landed
        let base = res.final_url.clone();

        if let Some(g) = find_google_form(&html) {
            if let Ok(form_url) = Url::parse(&g.url) {
                info!(%form_url, "google form on homepage");
                return StageOutcome::Found(SearchResult::found(
                    homepage,
                    Some(form_url),
                    vec!["google_forms".into()],
                    SearchMethod::HomepageGoogleFormsDirect,
                ));
            }
        }

        if let Some(link) = best_navigation_link(&html, &base) {
            debug!(url = %link.url, score = link.score, text = %link.text, "navigation candidate");
            if let Some(found) = self.follow_link(ctx, state, &link, &html, &base).await {
                return StageOutcome::Found(found);
            }
        }

        if let Some(provider) = embedded_form_provider(&html) {
            info!(%homepage, provider, "embedded form on homepage");
            return StageOutcome::Found(SearchResult::found(
                homepage.clone(),
                Some(homepage),
                vec![provider.to_string()],
                SearchMethod::HomepageEmbeddedFallback,
            ));
        }

        StageOutcome::Continue
    }
}

impl HtmlAnalysisStrategy {
    async fn follow_link(
        &self,
        ctx: &SearchContext<'_>,
        state: &mut SearchState,
        link: &NavigationLink,
        homepage_html: &str,
        base: &Url,
    ) -> Option<SearchResult> {
        if state.is_form_confirmed(&link.url) {
            debug!(url = %link.url, "already confirmed");
            return None;
        }

        let mut keywords = vec![link.text.clone()];
        keywords.extend(link.reasons.iter().cloned());

        let same_page = is_same_page_fragment(&link.url, base)
            || is_same_page_fragment(&link.url, &origin_root(base));
        if same_page {
            let r = analyze_anchor_section(homepage_html, &link.url, base);
            if r.is_found() {
                return Some(SearchResult {
                    search_method: SearchMethod::HomepageNavigationSpaAnchor,
                    ..r
                });
            }
            return None;
        }

        let page = match ctx.fetch(&link.url, ctx.config.probe_timeout()).await {
            Ok(p) if p.is_success() => p.text(),
            Ok(p) => {
                debug!(url = %link.url, status = p.status, "navigation link not usable");
                return None;
            }
            Err(e) => {
                debug!(url = %link.url, kind = %e.kind, "navigation link fetch failed");
                return None;
            }
        };

        if is_valid_contact_form_with(&page, ctx.config.min_contact_fields) {
            state.mark_form_confirmed(&link.url);
            return Some(SearchResult::found(
                link.url.clone(),
                Some(link.url.clone()),
                keywords,
                SearchMethod::HomepageNavigationForm,
            ));
        }

        if let Some(g) = find_valid_google_form(&page) {
            if let Ok(form_url) = Url::parse(&g.url) {
                state.mark_form_confirmed(&link.url);
                return Some(SearchResult::found(
                    link.url.clone(),
                    Some(form_url),
                    keywords,
                    SearchMethod::HomepageNavigationGoogleForms,
                ));
            }
        }

        if matches!(
            detect_form(&page).kind,
            Some(FormKind::ScriptRecaptcha | FormKind::EmbeddedThirdparty)
        ) {
            return Some(SearchResult::found(
                link.url.clone(),
                Some(link.url.clone()),
                keywords,
                SearchMethod::HomepageNavigationDynamicForm,
            ));
        }

        self.keyword_based(ctx, link, keywords)
    }

    fn keyword_based(
        &self,
        ctx: &SearchContext<'_>,
        link: &NavigationLink,
        keywords: Vec<String>,
    ) -> Option<SearchResult> {
        (link.score >= ctx.config.keyword_threshold).then(|| {
            SearchResult::found(
                link.url.clone(),
                None,
                keywords,
                SearchMethod::HomepageNavigationKeywordBased,
            )
        })
    }
}
