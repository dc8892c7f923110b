use std::collections::{HashMap, HashSet};

use serde::Serialize;
use url::Url;

use crate::form_detect::FormKind;
use crate::keywords::{contains_any, FALLBACK_PATTERNS, LOCALIZED_CONTACT_SEGMENTS};
use crate::spa::detect_repeated_content;
use crate::text_utils::decoded_path;

pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.7;
const MAX_SIMPLE_SEGMENTS: usize = 4;

/// Why a visited page was kept as a candidate instead of confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateReason {
    NoStructuredForm,
    DynamicForm(FormKind),
    GoogleFormRejected,
}

impl CandidateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateReason::NoStructuredForm => "no_structured_form",
            CandidateReason::DynamicForm(FormKind::ScriptRecaptcha) => "dynamic_form_captcha",
            CandidateReason::DynamicForm(FormKind::EmbeddedThirdparty) => "dynamic_form_embedded",
            CandidateReason::DynamicForm(_) => "dynamic_form",
            CandidateReason::GoogleFormRejected => "google_form_rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub url: Url,
    pub reason: CandidateReason,
    pub score: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidUrl {
    pub url: Url,
    pub pattern_matched: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackSelection {
    pub url: Url,
    pub pattern_matched: String,
    pub fallback_pattern: Option<&'static str>,
    pub confidence: f64,
}

impl FallbackSelection {
    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= HIGH_CONFIDENCE_THRESHOLD
    }
}

/// Accumulated findings for one `discover` call. Owned by that call and
/// passed by `&mut` into each strategy; never shared between targets.
#[derive(Debug, Default)]
pub struct SearchState {
    candidates: Vec<Candidate>,
    valid_urls: Vec<ValidUrl>,
    confirmed_form_urls: HashSet<String>,
    content_hash_cache: HashMap<String, u64>,
    spa_anchor_attempted: bool,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_candidate(&mut self, url: Url, reason: CandidateReason, score: i32) {
        self.candidates.push(Candidate { url, reason, score });
    }

    pub fn add_valid_url(&mut self, url: Url, pattern_matched: impl Into<String>) {
        self.valid_urls.push(ValidUrl {
            url,
            pattern_matched: pattern_matched.into(),
        });
    }

    pub fn mark_form_confirmed(&mut self, url: &Url) {
        self.confirmed_form_urls.insert(url.as_str().to_string());
    }

    pub fn is_form_confirmed(&self, url: &Url) -> bool {
        self.confirmed_form_urls.contains(url.as_str())
    }

    pub fn cache_hash(&mut self, url: &Url, hash: u64) {
        self.content_hash_cache.insert(url.as_str().to_string(), hash);
    }

    pub fn get_cached_hash(&self, url: &Url) -> Option<u64> {
        self.content_hash_cache.get(url.as_str()).copied()
    }

    /// Runs repeated-content detection against this run's hash cache.
    pub fn detect_repeated_content(&mut self, pages: &[String], html: &str) -> bool {
        detect_repeated_content(pages, html, &mut self.content_hash_cache)
    }

    /// Returns true the first time it is called.
    pub fn begin_spa_anchor_attempt(&mut self) -> bool {
        !std::mem::replace(&mut self.spa_anchor_attempted, true)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn valid_urls(&self) -> &[ValidUrl] {
        &self.valid_urls
    }

    /// Best recorded valid URL: the first one matching the strongest
    /// fallback pattern, else the first one recorded.
    pub fn select_fallback(&self) -> Option<FallbackSelection> {
        let first = self.valid_urls.first()?;

        for pattern in FALLBACK_PATTERNS.iter().copied() {
            if let Some(v) = self
                .valid_urls
                .iter()
                .find(|v| decoded_path(&v.url).contains(pattern))
            {
                return Some(FallbackSelection {
                    url: v.url.clone(),
                    pattern_matched: v.pattern_matched.clone(),
                    fallback_pattern: Some(pattern),
                    confidence: fallback_confidence(&v.url, Some(pattern)),
                });
            }
        }

        Some(FallbackSelection {
            url: first.url.clone(),
            pattern_matched: first.pattern_matched.clone(),
            fallback_pattern: None,
            confidence: fallback_confidence(&first.url, None),
        })
    }
}

fn fallback_confidence(url: &Url, pattern: Option<&str>) -> f64 {
    // whole points out of 100
    let strength: u32 = match pattern {
        Some(p) if p.starts_with("/contact") => 50,
        Some(p) if p.starts_with("/inquiry") => 40,
        Some(_) => 30,
        None => 10,
    };
    let path = decoded_path(url);
    let segments = path.split('/').filter(|s| !s.is_empty()).count();
    let simple = if segments <= MAX_SIMPLE_SEGMENTS { 20 } else { 0 };
    let localized = if contains_any(&path, LOCALIZED_CONTACT_SEGMENTS) { 20 } else { 0 };
    f64::from((strength + simple + localized).min(100)) / 100.0
}
