use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::keywords::{
    contains_any, CAPTCHA_FINGERPRINTS, CONTACT_FIELD_GROUPS, EMBEDDED_FORM_PROVIDERS,
    GOOGLE_FORM_CONTACT_TERMS, GOOGLE_FORM_EXCLUSION_TERMS,
};
use crate::text_utils::char_window;

pub const DEFAULT_MIN_CONTACT_FIELDS: usize = 2;
const GOOGLE_FORM_CONTEXT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Html,
    GoogleForms,
    ScriptRecaptcha,
    EmbeddedThirdparty,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Html => "html",
            FormKind::GoogleForms => "google_forms",
            FormKind::ScriptRecaptcha => "script_recaptcha",
            FormKind::EmbeddedThirdparty => "embedded_thirdparty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDetection {
    pub found: bool,
    pub form_url: Option<String>,
    pub kind: Option<FormKind>,
    pub confidence: u8,
}

impl FormDetection {
    fn none() -> Self {
        Self {
            found: false,
            form_url: None,
            kind: None,
            confidence: 0,
        }
    }

    fn hit(kind: FormKind, confidence: u8, form_url: Option<String>) -> Self {
        Self {
            found: true,
            form_url,
            kind: Some(kind),
            confidence,
        }
    }
}

/// A Google Forms link found in markup: `raw` as written, `url` normalized
/// to the canonical view URL.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleFormMatch {
    pub raw: String,
    pub url: String,
}

static RE_FORM_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<form\b([^>]*)>(.*?)</form\s*>"#).unwrap());
static RE_SUBMIT_INPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<input\b[^>]*\btype\s*=\s*["']?(?:submit|image)\b"#).unwrap()
});
static RE_BUTTON_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)<button\b([^>]*)>"#).unwrap());
static RE_TYPE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\btype\s*=\s*["']?([a-z]+)"#).unwrap());
// 検索/ログインフォームは問い合わせフォームではない
static RE_NON_CONTACT_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?is)\btype\s*=\s*["']?(?:search|password)\b"#,
        r#"|\brole\s*=\s*["']?search\b"#,
    ))
    .unwrap()
});
static RE_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<script\b").unwrap());
static RE_LINK_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\b(?:href|src|data-src|action)\s*=\s*["']([^"']+)["']"#).unwrap()
});
static RE_GOOGLE_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        concat!(
            r"(?i)^https?://(?:docs\.google\.com/forms/(?:u/\d+/)?d/(e/)?([A-Za-z0-9_-]+)",
            r"|(?:forms\.gle|goo\.gl/forms)/[A-Za-z0-9_-]+)",
        ),
    )
    .unwrap()
});
static RE_FIELD_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<(?:input|textarea|select)\b[^>]*>"#).unwrap());
static RE_NAME_OR_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\b(?:name|id)\s*=\s*["']([^"']+)["']"#).unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script.*?</script>|<style.*?</style>|<!--.*?-->|<[^>]+>").unwrap()
});
static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").unwrap()
});
static RE_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:\+81[-\s]?\d{1,4}|\b0\d{1,4})[-‐－ー]\d{1,4}[-‐－ー]\d{3,4}\b",
        r"|\(\d{3}\)\s?\d{3}-\d{4}",
    ))
    .unwrap()
});

/// Strips scripts, styles, comments and tags.
pub fn visible_text(markup: &str) -> String {
    RE_TAG.replace_all(markup, " ").into_owned()
}

/// True when `markup` anywhere contains a submit control: a submit/image
/// input or a button that is untyped or typed `submit`.
pub fn has_submit_control(markup: &str) -> bool {
    if RE_SUBMIT_INPUT.is_match(markup) {
        return true;
    }
    RE_BUTTON_TAG.captures_iter(markup).any(|c| {
        let attrs = c.get(1).map(|m| m.as_str()).unwrap_or("");
        match RE_TYPE_ATTR.captures(attrs) {
            None => true,
            Some(t) => t[1].eq_ignore_ascii_case("submit"),
        }
    })
}

/// A `<form>` block with a submit control that is not a search or login form.
pub fn has_native_form(markup: &str) -> bool {
    RE_FORM_BLOCK.captures_iter(markup).any(|c| {
        let open = c.get(1).map(|m| m.as_str()).unwrap_or("");
        let inner = c.get(2).map(|m| m.as_str()).unwrap_or("");
        !RE_NON_CONTACT_FORM.is_match(open)
            && !RE_NON_CONTACT_FORM.is_match(inner)
            && has_submit_control(inner)
    })
}

/// Canonical view URL for a Google Forms link, or `None` for submission
/// receipts (`/formResponse`) and non-form URLs.
pub fn normalize_google_form_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let absolute = if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    };
    if absolute.to_lowercase().contains("/formresponse") {
        return None;
    }
    let caps = RE_GOOGLE_FORM.captures(&absolute)?;
    match caps.get(2) {
        Some(id) => {
            let e = if caps.get(1).is_some() { "e/" } else { "" };
            Some(format!(
                "https://docs.google.com/forms/d/{e}{}/viewform",
                id.as_str()
            ))
        }
        // forms.gle / goo.gl short links
        None => {
            let short = caps.get(0)?.as_str();
            Some(short.replacen("http://", "https://", 1))
        }
    }
}

/// Every distinct Google Forms link/iframe target in `markup`, in document order.
pub fn find_google_forms(markup: &str) -> Vec<GoogleFormMatch> {
    let mut out: Vec<GoogleFormMatch> = Vec::new();
    for c in RE_LINK_ATTR.captures_iter(markup) {
        let raw = &c[1];
        if let Some(url) = normalize_google_form_url(raw) {
            if !out.iter().any(|m| m.url == url) {
                out.push(GoogleFormMatch {
                    raw: raw.to_string(),
                    url,
                });
            }
        }
    }
    out
}

pub fn find_google_form(markup: &str) -> Option<GoogleFormMatch> {
    find_google_forms(markup).into_iter().next()
}

/// First Google Form in `markup` that passes [`validate_google_form_content`].
pub fn find_valid_google_form(markup: &str) -> Option<GoogleFormMatch> {
    find_google_forms(markup)
        .into_iter()
        .find(|m| validate_google_form_content(markup, &m.raw))
}

fn has_captcha_form(markup: &str) -> bool {
    if !RE_SCRIPT.is_match(markup) {
        return false;
    }
    let lc = markup.to_lowercase();
    contains_any(&lc, CAPTCHA_FINGERPRINTS)
}

pub fn embedded_form_provider(markup: &str) -> Option<&'static str> {
    let lc = markup.to_lowercase();
    EMBEDDED_FORM_PROVIDERS.iter().copied().find(|p| lc.contains(p))
}

/// Ranked form detection; the first matching technique wins.
pub fn detect_form(markup: &str) -> FormDetection {
    if has_native_form(markup) {
        return FormDetection::hit(FormKind::Html, 90, None);
    }
    if let Some(g) = find_google_form(markup) {
        return FormDetection::hit(FormKind::GoogleForms, 95, Some(g.url));
    }
    if has_captcha_form(markup) {
        return FormDetection::hit(FormKind::ScriptRecaptcha, 70, None);
    }
    if embedded_form_provider(markup).is_some() {
        return FormDetection::hit(FormKind::EmbeddedThirdparty, 60, None);
    }
    FormDetection::none()
}

/// Names of the contact field groups present among form controls.
pub fn contact_field_groups(markup: &str) -> Vec<&'static str> {
    let mut names = Vec::new();
    for tag in RE_FIELD_TAG.find_iter(markup) {
        for c in RE_NAME_OR_ID.captures_iter(tag.as_str()) {
            names.push(c[1].to_lowercase());
        }
    }
    CONTACT_FIELD_GROUPS
        .iter()
        .filter(|(_, terms)| names.iter().any(|n| contains_any(n, terms)))
        .map(|(group, _)| *group)
        .collect()
}

/// Strict accept/reject: enough contact fields and a submit control.
pub fn is_valid_contact_form(markup: &str) -> bool {
    is_valid_contact_form_with(markup, DEFAULT_MIN_CONTACT_FIELDS)
}

pub fn is_valid_contact_form_with(markup: &str, min_fields: usize) -> bool {
    contact_field_groups(markup).len() >= min_fields && has_submit_control(markup)
}

/// Judges whether a Google Form is a contact form from the text around its
/// first occurrence, then from the whole page.
pub fn validate_google_form_content(markup: &str, form_url: &str) -> bool {
    if form_url.to_lowercase().contains("/formresponse") {
        return false;
    }
    let lc = markup.to_lowercase();
    let needle = form_url.to_lowercase();
    let located = lc.find(&needle).or_else(|| {
        RE_GOOGLE_FORM
            .captures(&needle)
            .and_then(|c| c.get(2))
            .and_then(|id| lc.find(id.as_str()))
    });

    if let Some(at) = located {
        let window = visible_text(char_window(&lc, at, GOOGLE_FORM_CONTEXT_CHARS));
        if contains_any(&window, GOOGLE_FORM_EXCLUSION_TERMS) {
            return false;
        }
        if contains_any(&window, GOOGLE_FORM_CONTACT_TERMS) {
            return true;
        }
    }
    contains_any(&visible_text(&lc), GOOGLE_FORM_CONTACT_TERMS)
}

/// Contact signals (form tag, email, phone) present in an excerpt.
pub fn extract_contact_signals(excerpt: &str) -> Vec<&'static str> {
    let mut signals = Vec::new();
    let lc = excerpt.to_lowercase();
    if lc.contains("<form") {
        signals.push("form_tag");
    }
    let has_email = lc.contains("mailto:")
        || RE_EMAIL.find_iter(&lc).any(|m| {
            let s = m.as_str();
            ![".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"]
                .iter()
                .any(|ext| s.ends_with(ext))
        });
    if has_email {
        signals.push("email");
    }
    if lc.contains("tel:") || RE_PHONE.is_match(excerpt) {
        signals.push("phone");
    }
    signals
}
