//! Contact-intent scoring for a single link: URL, visible text and the page
//! region the link was found in.

use serde::Serialize;
use url::Url;

use crate::keywords::{
    first_match, CONTACT_PATH_SEGMENTS, EXCLUSION_TERMS, GENERIC_PATH_SEGMENTS,
    HIGH_PRIORITY_TERMS, MEDIUM_PRIORITY_TERMS, SERVICE_PATH_SEGMENT,
};
use crate::text_utils::decoded_path;

pub const EXCLUSION_PENALTY: i32 = -15;
pub const HIGH_IN_TEXT: i32 = 10;
pub const HIGH_IN_URL: i32 = 8;
pub const MEDIUM_IN_TEXT: i32 = 3;
pub const MEDIUM_IN_URL: i32 = 2;
pub const CONTACT_PATH_BONUS: i32 = 15;
pub const SERVICE_PATH_PENALTY: i32 = -10;
pub const GENERIC_PATH_PENALTY: i32 = -5;
pub const NAVIGATION_BONUS: i32 = 5;
pub const FOOTER_BONUS: i32 = 3;

/// Where on the page a link was extracted from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkContext {
    pub in_navigation: bool,
    pub in_footer: bool,
}

impl LinkContext {
    pub const NAVIGATION: LinkContext = LinkContext { in_navigation: true, in_footer: false };
    pub const FOOTER: LinkContext = LinkContext { in_navigation: false, in_footer: true };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurityResult {
    /// Clamped to zero; use this for ranking.
    pub score: i32,
    /// Unclamped sum, may be negative.
    pub raw_score: i32,
    pub reasons: Vec<String>,
}

impl PurityResult {
    fn finish(raw_score: i32, reasons: Vec<String>) -> Self {
        Self {
            score: raw_score.max(0),
            raw_score,
            reasons,
        }
    }
}

/// Scores `(url, link_text, context)` for contact intent. `reasons` lists
/// every rule that fired, in the order applied.
pub fn calculate_purity(url: &Url, link_text: &str, context: Option<LinkContext>) -> PurityResult {
    let text = link_text.trim().to_lowercase();
    let path = decoded_path(url);
    let url_text = format!("{}{}", path, url.fragment().unwrap_or("").to_lowercase());

    let mut reasons = Vec::new();

    if let Some(term) =
        first_match(&url_text, EXCLUSION_TERMS).or_else(|| first_match(&text, EXCLUSION_TERMS))
    {
        reasons.push(format!("exclusion:{term}:{EXCLUSION_PENALTY}"));
        return PurityResult::finish(EXCLUSION_PENALTY, reasons);
    }

    let mut score = 0;

    for term in HIGH_PRIORITY_TERMS {
        if text.contains(term) {
            score += HIGH_IN_TEXT;
            reasons.push(format!("high_text:{term}:+{HIGH_IN_TEXT}"));
        } else if url_text.contains(term) {
            score += HIGH_IN_URL;
            reasons.push(format!("high_url:{term}:+{HIGH_IN_URL}"));
        }
    }

    for term in MEDIUM_PRIORITY_TERMS {
        if text.contains(term) {
            score += MEDIUM_IN_TEXT;
            reasons.push(format!("medium_text:{term}:+{MEDIUM_IN_TEXT}"));
        } else if url_text.contains(term) {
            score += MEDIUM_IN_URL;
            reasons.push(format!("medium_url:{term}:+{MEDIUM_IN_URL}"));
        }
    }

    // "/contact" and "/contact/" are the same page for structural rules
    let slashed = if path.ends_with('/') { path.clone() } else { format!("{path}/") };

    if let Some(seg) = first_match(&slashed, CONTACT_PATH_SEGMENTS) {
        score += CONTACT_PATH_BONUS;
        reasons.push(format!("contact_path:{seg}:+{CONTACT_PATH_BONUS}"));
    }

    if slashed.contains(SERVICE_PATH_SEGMENT) {
        score += SERVICE_PATH_PENALTY;
        reasons.push(format!("service_path:{SERVICE_PATH_PENALTY}"));
    }
    if let Some(seg) = first_match(&slashed, GENERIC_PATH_SEGMENTS) {
        score += GENERIC_PATH_PENALTY;
        reasons.push(format!("generic_path:{seg}:{GENERIC_PATH_PENALTY}"));
    }

    match context {
        Some(ctx) if ctx.in_navigation => {
            score += NAVIGATION_BONUS;
            reasons.push(format!("navigation:+{NAVIGATION_BONUS}"));
        }
        Some(ctx) if ctx.in_footer => {
            score += FOOTER_BONUS;
            reasons.push(format!("footer:+{FOOTER_BONUS}"));
        }
        _ => {}
    }

    PurityResult::finish(score, reasons)
}

/// The contact-keyword filter applied before a link may win.
pub fn has_contact_keyword(url: &Url, link_text: &str) -> bool {
    let text = link_text.to_lowercase();
    let url_text = format!("{}{}", decoded_path(url), url.fragment().unwrap_or("").to_lowercase());
    HIGH_PRIORITY_TERMS
        .iter()
        .any(|t| text.contains(t) || url_text.contains(t))
}
