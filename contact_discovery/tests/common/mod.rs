#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use contact_discovery::{
    ContactDiscoverer, DiscoveryConfig, Fetch, FetchResult, NetworkError, NetworkErrorKind,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NOT_FOUND_BODY: &str = "<html><body><h1>404</h1></body></html>";

#[derive(Clone)]
enum Canned {
    Page { status: u16, body: String },
    Fail(NetworkErrorKind),
    /// Answers with whatever `to` answers, landing on `to`.
    Redirect { to: String },
}

/// Scripted responses keyed by absolute URL. Unscripted URLs answer with
/// the default (404 unless changed). Every request is recorded in order.
pub struct FixtureFetcher {
    routes: HashMap<String, Canned>,
    default: Canned,
    requests: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            default: Canned::Page {
                status: 404,
                body: NOT_FOUND_BODY.to_string(),
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    fn key(url: &str) -> String {
        Url::parse(url).expect("fixture url").to_string()
    }

    pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            Self::key(url),
            Canned::Page {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn fail(mut self, url: &str, kind: NetworkErrorKind) -> Self {
        self.routes.insert(Self::key(url), Canned::Fail(kind));
        self
    }

    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.routes.insert(Self::key(from), Canned::Redirect { to: Self::key(to) });
        self
    }

    pub fn default_page(mut self, status: u16, body: &str) -> Self {
        self.default = Canned::Page {
            status,
            body: body.to_string(),
        };
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests other than the liveness check of `root`.
    pub fn requests_after(&self, root: &str) -> Vec<String> {
        let root = Self::key(root);
        let mut reqs = self.requests();
        if reqs.first() == Some(&root) {
            reqs.remove(0);
        }
        reqs
    }
}

#[async_trait]
impl Fetch for FixtureFetcher {
    async fn get(&self, url: &Url, _timeout: Duration) -> Result<FetchResult, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut final_url = url.clone();
        let mut canned = self.routes.get(url.as_str()).unwrap_or(&self.default);
        if let Canned::Redirect { to } = canned {
            final_url = Url::parse(to).expect("redirect target");
            canned = self.routes.get(to.as_str()).unwrap_or(&self.default);
        }
        match canned {
            Canned::Page { status, body } => Ok(FetchResult {
                status: *status,
                final_url,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: Bytes::from(body.clone()),
            }),
            Canned::Fail(kind) => Err(NetworkError::new(
                *kind,
                url.as_str(),
                format!("scripted {kind} failure"),
            )),
            Canned::Redirect { .. } => panic!("redirect chains are not scripted"),
        }
    }
}

pub fn test_config() -> DiscoveryConfig {
    DiscoveryConfig {
        request_delay_ms: 0,
        ..DiscoveryConfig::default()
    }
}

pub fn discoverer(fixture: FixtureFetcher) -> (ContactDiscoverer, Arc<FixtureFetcher>) {
    discoverer_with(fixture, test_config())
}

pub fn discoverer_with(
    fixture: FixtureFetcher,
    config: DiscoveryConfig,
) -> (ContactDiscoverer, Arc<FixtureFetcher>) {
    let fixture = Arc::new(fixture);
    let d = ContactDiscoverer::new(fixture.clone(), config);
    (d, fixture)
}

/// Plain page long enough to pass the validity check, with no form markup.
pub fn plain_page(title: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body><h1>{title}</h1>\
         <p>Thank you for visiting our corporate website.</p></body></html>"
    )
}

/// Serves `(path, status, html)` routes; anything else is wiremock's 404.
pub async fn html_server(routes: &[(&str, u16, &str)]) -> MockServer {
    let server = MockServer::start().await;
    for (p, status, body) in routes {
        Mock::given(method("GET"))
            .and(path(*p))
            .respond_with(
                ResponseTemplate::new(*status)
                    .set_body_string(body.to_string())
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;
    }
    server
}

/// Every GET is answered after `delay`.
pub async fn slow_server(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>slow</body></html>")
                .insert_header("content-type", "text/html")
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}
