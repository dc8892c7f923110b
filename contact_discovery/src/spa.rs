//! Single-page-app shells: many paths, one body. When a site answers every
//! pattern URL with the same markup, contact information lives under in-page
//! anchors rather than separate URLs.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::form_detect::extract_contact_signals;
use crate::keywords::{contains_any, HIGH_PRIORITY_TERMS};
use crate::purity::has_contact_keyword;
use crate::result::{SearchMethod, SearchResult};
use crate::text_utils::{char_prefix_from, char_window, content_hash, resolve_url};

const SECTION_EXCERPT_CHARS: usize = 3000;
const KEYWORD_WINDOW_CHARS: usize = 1000;
const SAME_CONTENT_THRESHOLD: usize = 2;

static RE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<section\b[^>]*>.*?</section\s*>").unwrap());

/// Records the hash of `new_html` for every page key not cached yet and
/// reports whether at least two distinct keys now share that hash. Keys
/// must already be deduplicated by final location.
pub fn detect_repeated_content(
    urls: &[String],
    new_html: &str,
    cache: &mut HashMap<String, u64>,
) -> bool {
    let hash = content_hash(new_html);
    let mut same = 0usize;
    for u in urls {
        let stored = *cache.entry(u.clone()).or_insert(hash);
        if stored == hash {
            same += 1;
        }
    }
    debug!(urls = urls.len(), same, "repeated content check");
    same >= SAME_CONTENT_THRESHOLD
}

/// Fragment links on the page that point at contact sections, in document
/// order, followed by a plain `#contact`.
pub fn contact_anchor_urls(html: &str, base: &Url) -> Vec<Url> {
    static SEL_A: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

    let doc = Html::parse_document(html);
    let mut out: Vec<Url> = Vec::new();
    for a in doc.select(&SEL_A) {
        let href = match a.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };
        if !href.starts_with('#') || href.len() < 2 {
            continue;
        }
        let text = a.text().collect::<String>();
        let Some(u) = resolve_url(base, href) else { continue };
        if has_contact_keyword(&u, &text) && !out.contains(&u) {
            out.push(u);
        }
    }
    let mut default = base.clone();
    default.set_fragment(Some("contact"));
    if !out.contains(&default) {
        out.push(default);
    }
    out
}

fn find_anchor_excerpt<'a>(html: &'a str, fragment: &str) -> Option<&'a str> {
    let escaped = regex::escape(fragment);
    let by_attr = Regex::new(&format!(
        r#"(?is)<[a-z][a-z0-9]*\b[^>]*\b(?:id|name)\s*=\s*["']{escaped}["'][^>]*>"#
    ))
    .ok()?;
    if let Some(m) = by_attr.find(html) {
        return Some(char_prefix_from(html, m.start(), SECTION_EXCERPT_CHARS));
    }

    let lc_fragment = fragment.to_lowercase();
    if let Some(section) = RE_SECTION
        .find_iter(html)
        .find(|m| m.as_str().to_lowercase().contains(&lc_fragment))
    {
        return Some(section.as_str());
    }

    let lc = html.to_lowercase();
    if lc.len() != html.len() {
        // lowercasing changed byte offsets; search the original text instead
        return HIGH_PRIORITY_TERMS
            .iter()
            .find_map(|t| html.find(t))
            .map(|at| char_window(html, at, KEYWORD_WINDOW_CHARS));
    }
    HIGH_PRIORITY_TERMS
        .iter()
        .filter_map(|t| lc.find(t))
        .min()
        .map(|at| char_window(html, at, KEYWORD_WINDOW_CHARS))
}

/// Looks for contact signals in the section `anchor_url` points at. The
/// result is confirmed only when the excerpt carries at least one signal.
pub fn analyze_anchor_section(html: &str, anchor_url: &Url, base_url: &Url) -> SearchResult {
    let fragment = anchor_url.fragment().unwrap_or("").trim();
    if fragment.is_empty() {
        return SearchResult::failure(SearchMethod::NotFound);
    }

    let Some(excerpt) = find_anchor_excerpt(html, fragment) else {
        debug!(%anchor_url, "no section for anchor");
        return SearchResult::failure(SearchMethod::NotFound);
    };

    let signals = extract_contact_signals(excerpt);
    if signals.is_empty() {
        debug!(%anchor_url, "anchor section has no contact signal");
        return SearchResult::failure(SearchMethod::NotFound);
    }

    let mut keywords: Vec<String> = signals.iter().map(|s| s.to_string()).collect();
    keywords.push(format!("#{fragment}"));
    let lc = excerpt.to_lowercase();
    if contains_any(&lc, HIGH_PRIORITY_TERMS) {
        keywords.push("contact_keyword".into());
    }

    debug!(%anchor_url, %base_url, ?signals, "anchor section confirmed");
    SearchResult::found(
        anchor_url.clone(),
        Some(anchor_url.clone()),
        keywords,
        SearchMethod::SpaAnchorAnalysis,
    )
}
