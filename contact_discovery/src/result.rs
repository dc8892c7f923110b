use std::fmt;

use serde::Serialize;
use url::Url;

use crate::error::NetworkErrorKind;

/// Which strategy or failure produced a [`SearchResult`]. The string tags
/// are stable; new tags may be added but existing ones keep their meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    ContactFormPrioritySearch,
    GoogleFormsPrioritySearch,
    SpaAnchorAnalysis,
    HomepageGoogleFormsDirect,
    HomepageNavigationForm,
    HomepageNavigationGoogleForms,
    HomepageNavigationDynamicForm,
    HomepageNavigationKeywordBased,
    HomepageNavigationSpaAnchor,
    HomepageEmbeddedFallback,
    FinalFallbackHighConfidence,
    FinalFallbackLowConfidence,
    DnsError,
    BotBlocked,
    TimeoutError,
    ConnectionError,
    SslError,
    FetchError,
    SiteClosed,
    SnsNotSupported,
    InvalidUrl,
    NotFound,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::ContactFormPrioritySearch => "contact_form_priority_search",
            SearchMethod::GoogleFormsPrioritySearch => "google_forms_priority_search",
            SearchMethod::SpaAnchorAnalysis => "spa_anchor_analysis",
            SearchMethod::HomepageGoogleFormsDirect => "homepage_google_forms_direct",
            SearchMethod::HomepageNavigationForm => "homepage_navigation_form",
            SearchMethod::HomepageNavigationGoogleForms => "homepage_navigation_google_forms",
            SearchMethod::HomepageNavigationDynamicForm => "homepage_navigation_dynamic_form",
            SearchMethod::HomepageNavigationKeywordBased => "homepage_navigation_keyword_based",
            SearchMethod::HomepageNavigationSpaAnchor => "homepage_navigation_spa_anchor",
            SearchMethod::HomepageEmbeddedFallback => "homepage_embedded_fallback",
            SearchMethod::FinalFallbackHighConfidence => "final_fallback_high_confidence",
            SearchMethod::FinalFallbackLowConfidence => "final_fallback_low_confidence",
            SearchMethod::DnsError => "dns_error",
            SearchMethod::BotBlocked => "bot_blocked",
            SearchMethod::TimeoutError => "timeout_error",
            SearchMethod::ConnectionError => "connection_error",
            SearchMethod::SslError => "ssl_error",
            SearchMethod::FetchError => "fetch_error",
            SearchMethod::SiteClosed => "site_closed",
            SearchMethod::SnsNotSupported => "sns_not_supported",
            SearchMethod::InvalidUrl => "invalid_url",
            SearchMethod::NotFound => "not_found",
        }
    }

    /// Tags that stop the search for a target.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SearchMethod::DnsError
                | SearchMethod::BotBlocked
                | SearchMethod::TimeoutError
                | SearchMethod::ConnectionError
                | SearchMethod::SslError
                | SearchMethod::FetchError
                | SearchMethod::SiteClosed
                | SearchMethod::SnsNotSupported
                | SearchMethod::InvalidUrl
                | SearchMethod::NotFound
        )
    }

    /// Message written back to the batch source for failed rows.
    pub fn error_message(&self) -> Option<&'static str> {
        let msg = match self {
            SearchMethod::DnsError => "domain does not resolve",
            SearchMethod::BotBlocked => "blocked by anti-bot protection (HTTP 403/501)",
            SearchMethod::TimeoutError => "request timed out",
            SearchMethod::ConnectionError => "connection failed",
            SearchMethod::SslError => "TLS/certificate error",
            SearchMethod::FetchError => "homepage could not be fetched",
            SearchMethod::SiteClosed => "site appears to be closed",
            SearchMethod::SnsNotSupported => "social media URLs are not supported",
            SearchMethod::InvalidUrl => "invalid URL",
            SearchMethod::NotFound => "contact page not found",
            _ => return None,
        };
        Some(msg)
    }

    /// Terminal tag for a transport failure during the search itself.
    pub fn from_network_error(kind: NetworkErrorKind) -> Self {
        match kind {
            NetworkErrorKind::Dns => SearchMethod::DnsError,
            NetworkErrorKind::Timeout => SearchMethod::TimeoutError,
            NetworkErrorKind::Connection => SearchMethod::ConnectionError,
            NetworkErrorKind::Tls => SearchMethod::SslError,
            _ => SearchMethod::FetchError,
        }
    }

    /// Terminal tag for a failed liveness pre-check.
    pub fn from_liveness_error(kind: NetworkErrorKind) -> Self {
        match kind {
            NetworkErrorKind::Dns => SearchMethod::DnsError,
            NetworkErrorKind::Timeout => SearchMethod::TimeoutError,
            _ => SearchMethod::SiteClosed,
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's only output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub contact_url: Option<Url>,
    pub actual_form_url: Option<Url>,
    pub found_keywords: Vec<String>,
    pub search_method: SearchMethod,
}

impl SearchResult {
    pub fn found(
        contact_url: Url,
        actual_form_url: Option<Url>,
        found_keywords: Vec<String>,
        search_method: SearchMethod,
    ) -> Self {
        Self {
            contact_url: Some(contact_url),
            actual_form_url,
            found_keywords,
            search_method,
        }
    }

    pub fn failure(search_method: SearchMethod) -> Self {
        Self {
            contact_url: None,
            actual_form_url: None,
            found_keywords: Vec::new(),
            search_method,
        }
    }

    pub fn is_found(&self) -> bool {
        self.contact_url.is_some()
    }

    /// The most specific URL to act on: the form itself when known.
    pub fn best_url(&self) -> Option<&Url> {
        self.actual_form_url.as_ref().or(self.contact_url.as_ref())
    }
}
