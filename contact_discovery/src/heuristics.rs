use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::form_detect::contact_field_groups;
use crate::keywords::{
    contains_any, INVALID_PAGE_MARKERS, LOCALIZED_CONTACT_SEGMENTS, PRIORITY_PATTERNS,
    SOCIAL_MEDIA_DOMAINS,
};
use crate::state::CandidateReason;
use crate::text_utils::{decoded_path, extract_domain, url_stem};

pub const MIN_PAGE_BODY_LEN: usize = 50;

/// Probe URLs for every priority pattern, as `base + pattern`.
pub fn pattern_urls(target: &Url) -> Vec<(Url, &'static str)> {
    let base = url_stem(target);
    PRIORITY_PATTERNS
        .iter()
        .filter_map(|p| Url::parse(&format!("{base}{p}")).ok().map(|u| (u, *p)))
        .collect()
}

/// Rejects bodies too short to be a page, and placeholder/not-found pages
/// served with a 200.
pub fn is_valid_page(html: &str) -> bool {
    if html.trim().len() < MIN_PAGE_BODY_LEN {
        return false;
    }
    let lc = html.to_lowercase();
    !contains_any(&lc, INVALID_PAGE_MARKERS)
}

pub fn is_social_media(u: &Url) -> bool {
    let Some(domain) = extract_domain(u) else {
        return false;
    };
    SOCIAL_MEDIA_DOMAINS
        .iter()
        .any(|d| domain == *d || domain.ends_with(&format!(".{d}")))
}

/// Ranking score for a page kept as a candidate: path specificity, form
/// structure and contact field names, less a penalty when no form was seen.
pub fn candidate_score(url: &Url, html: &str, reason: CandidateReason) -> i32 {
    static RE_FORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<form\b").unwrap());
    static RE_FIELD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?is)<(?:input|textarea|select)\b[^>]*>").unwrap());
    static RE_HIDDEN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?i)\btype\s*=\s*["']?hidden"#).unwrap());

    let path = decoded_path(url);
    let contact_path =
        path.contains("/contact") || contains_any(&path, LOCALIZED_CONTACT_SEGMENTS);
    let mut score = if contact_path {
        30
    } else if path.contains("/inquiry") {
        25
    } else if path.contains("/form") {
        10
    } else {
        0
    };

    if RE_FORM.is_match(html) {
        score += 20;
        let fields = RE_FIELD
            .find_iter(html)
            .filter(|m| !RE_HIDDEN.is_match(m.as_str()))
            .count() as i32;
        score += (fields * 2).min(20);
    }

    score += contact_field_groups(html).len() as i32 * 5;

    if reason == CandidateReason::NoStructuredForm {
        score -= 15;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form_detect::FormKind;

    #[test]
    fn pattern_urls_keep_target_path_and_order() {
        let target = Url::parse("https://x.test/").unwrap();
        let urls = pattern_urls(&target);
        assert_eq!(urls.len(), PRIORITY_PATTERNS.len());
        assert_eq!(urls[0].0.as_str(), "https://x.test/contact/");
        assert_eq!(urls[1].0.as_str(), "https://x.test/contact");

        let nested = Url::parse("https://x.test/jp/?ref=1").unwrap();
        assert_eq!(pattern_urls(&nested)[0].0.as_str(), "https://x.test/jp/contact/");
    }

    #[test]
    fn page_validity() {
        assert!(!is_valid_page("<p>short</p>"));
        let filler = "x".repeat(100);
        assert!(is_valid_page(&format!("<p>{filler}</p>")));
        assert!(!is_valid_page(&format!("<h1>Page Not Found</h1>{filler}")));
        assert!(!is_valid_page(&format!("<h1>ただいま工事中です</h1>{filler}")));
    }

    #[test]
    fn social_media_hosts() {
        assert!(is_social_media(&Url::parse("https://www.facebook.com/acme").unwrap()));
        assert!(is_social_media(&Url::parse("https://m.facebook.com/acme").unwrap()));
        assert!(is_social_media(&Url::parse("https://x.com/acme").unwrap()));
        assert!(!is_social_media(&Url::parse("https://fox.com/").unwrap()));
        assert!(!is_social_media(&Url::parse("https://acme.co.jp/").unwrap()));
    }

    #[test]
    fn candidate_scores_rank_forms_above_plain_pages() {
        let contact = Url::parse("https://a.test/contact/").unwrap();
        let form_page =
            r#"<form><input name="name"><input name="email"><input type="hidden" name="t"></form>"#;
        let recaptcha = CandidateReason::DynamicForm(FormKind::ScriptRecaptcha);
        let with_form = candidate_score(&contact, form_page, recaptcha);
        // 30 path + 20 form + 2 fields * 2 + 2 groups * 5
        assert_eq!(with_form, 64);
        let plain = candidate_score(&contact, "<p>hello</p>", CandidateReason::NoStructuredForm);
        assert_eq!(plain, 15);
        assert!(with_form > plain);
    }
}
