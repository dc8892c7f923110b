use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT},
    redirect, Client,
};
use tracing::debug;
use url::Url;

use crate::error::NetworkError;
use crate::text_utils::decode_body;

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Missing content-type counts as HTML; only clearly binary bodies are rejected.
    pub fn is_html_like(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(ct) => {
                let lc = ct.to_lowercase();
                lc.starts_with("text/") || lc.contains("html") || lc.contains("xml")
            }
        }
    }

    pub fn text(&self) -> String {
        decode_body(&self.body)
    }
}

/// The engine's only way to the network. Implementations follow redirects
/// and never retry; failures come back as a classified [`NetworkError`].
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<FetchResult, NetworkError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<FetchResult, NetworkError> {
        let res = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| NetworkError::from_reqwest(url.as_str(), &e))?;

        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let final_url = res.url().clone();

        let body = res
            .bytes()
            .await
            .map_err(|e| NetworkError::from_reqwest(url.as_str(), &e))?;

        debug!(%url, %final_url, status, size = body.len(), "fetched");

        Ok(FetchResult {
            status,
            final_url,
            content_type,
            body,
        })
    }
}

fn chrome_like_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(USER_AGENT, HeaderValue::from_static(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
         AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0.0.0 Safari/537.36"
    ));
    h.insert(ACCEPT, HeaderValue::from_static(
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
    ));
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ja,en;q=0.9"));

    h.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    h.insert("Pragma", HeaderValue::from_static("no-cache"));
    h.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    h
}

/// No cookie store: requests never share session state.
pub fn make_browserish_client() -> Result<Client> {
    Ok(Client::builder()
        .default_headers(chrome_like_headers())
        .redirect(redirect::Policy::limited(10))
        .connect_timeout(Duration::from_secs(10))
        .tcp_keepalive(Duration::from_secs(30))
        .build()?)
}
