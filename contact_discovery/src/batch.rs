//! Many sites at once. Targets share nothing, so they fan out over a
//! bounded pool; each worker rests for the rate-limit delay after every
//! target it finishes.

use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, Instrument};

use crate::config::BatchConfig;
use crate::discovery::ContactDiscoverer;
use crate::result::{SearchMethod, SearchResult};

/// One row of the external sheet: its row id and the company homepage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub row_id: String,
    pub url: String,
}

impl BatchEntry {
    pub fn new(row_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            url: url.into(),
        }
    }
}

/// What gets written back for a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub row_id: String,
    pub url: String,
    pub contact_url: Option<String>,
    pub form_url: Option<String>,
    pub search_method: SearchMethod,
    pub error_message: Option<String>,
    pub success: bool,
}

impl BatchOutcome {
    pub fn from_result(entry: &BatchEntry, result: &SearchResult) -> Self {
        let success = result.is_found() && !result.search_method.is_error();
        Self {
            row_id: entry.row_id.clone(),
            url: entry.url.clone(),
            contact_url: result.contact_url.as_ref().map(|u| u.to_string()),
            form_url: result.actual_form_url.as_ref().map(|u| u.to_string()),
            search_method: result.search_method,
            error_message: result.search_method.error_message().map(str::to_string),
            success,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Same order as the input entries.
    pub outcomes: Vec<BatchOutcome>,
    pub elapsed_ms: u64,
}

pub async fn run_batch(
    discoverer: &ContactDiscoverer,
    entries: Vec<BatchEntry>,
    cfg: &BatchConfig,
) -> BatchSummary {
    let t0 = Instant::now();
    let total = entries.len();
    let sem = Semaphore::new(cfg.batch_size.max(1));
    let pause = cfg.rate_limit_delay();

    info!(total, workers = cfg.batch_size, "batch start");

    let mut futs = FuturesUnordered::new();
    for (idx, entry) in entries.into_iter().enumerate() {
        let sem = &sem;
        let span = info_span!("batch_row", row_id = %entry.row_id, url = %entry.url);
        futs.push(
            async move {
                // never closed, so acquire cannot fail
                let _permit = sem.acquire().await.ok();
                let result = discoverer.discover(&entry.url).await;
                let outcome = BatchOutcome::from_result(&entry, &result);
                debug!(method = %outcome.search_method, success = outcome.success, "row done");
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
                (idx, outcome)
            }
            .instrument(span),
        );
    }

    let mut slots: Vec<Option<BatchOutcome>> = vec![None; total];
    let mut done = 0usize;
    while let Some((idx, outcome)) = futs.next().await {
        slots[idx] = Some(outcome);
        done += 1;
        if done % 10 == 0 {
            debug!(done, total, "progress");
        }
    }

    let outcomes: Vec<BatchOutcome> = slots.into_iter().flatten().collect();
    let successful = outcomes.iter().filter(|o| o.success).count();
    let elapsed_ms = t0.elapsed().as_millis() as u64;
    info!(total, successful, elapsed_ms, "batch done");

    BatchSummary {
        total,
        successful,
        failed: total - successful,
        outcomes,
        elapsed_ms,
    }
}
