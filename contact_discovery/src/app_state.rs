use std::sync::Arc;

use contact_discovery::{BatchConfig, ContactDiscoverer, Fetch};

pub struct AppState {
    pub fetcher: Arc<dyn Fetch>,
    pub discoverer: ContactDiscoverer,
    pub batch: BatchConfig,
}
