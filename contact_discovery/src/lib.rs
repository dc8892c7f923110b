pub mod batch;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod form_detect;
pub mod heuristics;
pub mod keywords;
pub mod purity;
pub mod result;
pub mod spa;
pub mod state;
pub mod strategy;
pub mod text_utils;

pub use config::{AppConfig, BatchConfig, DiscoveryConfig};
pub use discovery::{ContactDiscoverer, DiscoveryReport};
pub use error::{ConfigError, NetworkError, NetworkErrorKind};
pub use fetch::{Fetch, FetchResult, HttpFetcher};
pub use result::{SearchMethod, SearchResult};
