use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Closed set of transport failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    Dns,
    Timeout,
    Connection,
    Tls,
    Redirect,
    Body,
    Other,
}

impl NetworkErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkErrorKind::Dns => "dns",
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Connection => "connection",
            NetworkErrorKind::Tls => "tls",
            NetworkErrorKind::Redirect => "redirect",
            NetworkErrorKind::Body => "body",
            NetworkErrorKind::Other => "other",
        }
    }

    /// Classifies raw transport error text. Order matters: a DNS failure is
    /// usually wrapped in a "connect" error, so it is checked first.
    pub fn classify_text(text: &str) -> Self {
        let lc = text.to_lowercase();

        const DNS: &[&str] = &[
            "dns error",
            "failed to lookup address",
            "name or service not known",
            "nodename nor servname",
            "no such host",
            "temporary failure in name resolution",
            "name resolution",
            "getaddrinfo",
            "nxdomain",
        ];
        const TIMEOUT: &[&str] = &["timed out", "timeout", "deadline has elapsed"];
        const TLS: &[&str] = &["certificate", "ssl", "tls", "handshake"];
        const CONNECTION: &[&str] = &[
            "connection refused",
            "connection reset",
            "connection closed",
            "connection aborted",
            "network is unreachable",
            "no route to host",
            "broken pipe",
            "error trying to connect",
        ];

        if DNS.iter().any(|n| lc.contains(n)) {
            NetworkErrorKind::Dns
        } else if TIMEOUT.iter().any(|n| lc.contains(n)) {
            NetworkErrorKind::Timeout
        } else if TLS.iter().any(|n| lc.contains(n)) {
            NetworkErrorKind::Tls
        } else if CONNECTION.iter().any(|n| lc.contains(n)) {
            NetworkErrorKind::Connection
        } else if lc.contains("redirect") {
            NetworkErrorKind::Redirect
        } else {
            NetworkErrorKind::Other
        }
    }
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed fetch, normalized at the client boundary.
#[derive(Debug, Clone, Error)]
#[error("{kind} error fetching {url}: {message}")]
pub struct NetworkError {
    pub kind: NetworkErrorKind,
    pub url: String,
    pub message: String,
}

impl NetworkError {
    pub fn new(kind: NetworkErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }

    /// Builds an error whose kind is derived from the message text.
    pub fn from_message(url: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: NetworkErrorKind::classify_text(&message),
            url: url.into(),
            message,
        }
    }

    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let chain = error_chain_text(err);
        // reqwest reports DNS failures as connect errors; the text decides.
        // The URL itself is left out so a host like "ssl-corp.jp" cannot skew it.
        let by_text = NetworkErrorKind::classify_text(&chain.replace(url, ""));
        let kind = if by_text == NetworkErrorKind::Dns {
            NetworkErrorKind::Dns
        } else if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_redirect() {
            NetworkErrorKind::Redirect
        } else if err.is_body() || err.is_decode() {
            NetworkErrorKind::Body
        } else if by_text != NetworkErrorKind::Other {
            by_text
        } else if err.is_connect() {
            NetworkErrorKind::Connection
        } else {
            NetworkErrorKind::Other
        };
        Self::new(kind, url, chain)
    }
}

fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        parts.push(e.to_string());
        source = e.source();
    }
    parts.join(": ")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}
