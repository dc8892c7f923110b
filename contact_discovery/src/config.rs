use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::form_detect::DEFAULT_MIN_CONTACT_FIELDS;

const ENV_TIME_BUDGET: &str = "CONTACT_DISCOVERY_TIME_BUDGET_SECS";
const ENV_PROBE_TIMEOUT: &str = "CONTACT_DISCOVERY_PROBE_TIMEOUT_SECS";
const ENV_HOMEPAGE_TIMEOUT: &str = "CONTACT_DISCOVERY_HOMEPAGE_TIMEOUT_SECS";
const ENV_LIVENESS_TIMEOUT: &str = "CONTACT_DISCOVERY_LIVENESS_TIMEOUT_SECS";
const ENV_REQUEST_DELAY: &str = "CONTACT_DISCOVERY_REQUEST_DELAY_MS";
const ENV_KEYWORD_THRESHOLD: &str = "CONTACT_DISCOVERY_KEYWORD_THRESHOLD";
const ENV_MIN_CONTACT_FIELDS: &str = "CONTACT_DISCOVERY_MIN_CONTACT_FIELDS";
const ENV_BATCH_SIZE: &str = "CONTACT_DISCOVERY_BATCH_SIZE";
const ENV_RATE_LIMIT_DELAY: &str = "CONTACT_DISCOVERY_RATE_LIMIT_DELAY_MS";
const ENV_BIND: &str = "CONTACT_DISCOVERY_BIND";

/// Tunables for one `discover` run. Every field has a default, so a JSON
/// body may override any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Wall-clock budget for the URL-pattern stage, checked before each probe.
    pub time_budget_secs: u64,
    pub probe_timeout_secs: u64,
    pub homepage_timeout_secs: u64,
    pub liveness_timeout_secs: u64,
    /// Courtesy delay slept before every outbound request.
    pub request_delay_ms: u64,
    /// Purity a navigation link needs to be accepted without form markup.
    pub keyword_threshold: i32,
    pub min_contact_fields: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: 30,
            probe_timeout_secs: 8,
            homepage_timeout_secs: 20,
            liveness_timeout_secs: 10,
            request_delay_ms: 200,
            keyword_threshold: 15,
            min_contact_fields: DEFAULT_MIN_CONTACT_FIELDS,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let cfg = Self {
            time_budget_secs: read(&lookup, ENV_TIME_BUDGET, d.time_budget_secs)?,
            probe_timeout_secs: read(&lookup, ENV_PROBE_TIMEOUT, d.probe_timeout_secs)?,
            homepage_timeout_secs: read(&lookup, ENV_HOMEPAGE_TIMEOUT, d.homepage_timeout_secs)?,
            liveness_timeout_secs: read(&lookup, ENV_LIVENESS_TIMEOUT, d.liveness_timeout_secs)?,
            request_delay_ms: read(&lookup, ENV_REQUEST_DELAY, d.request_delay_ms)?,
            keyword_threshold: read(&lookup, ENV_KEYWORD_THRESHOLD, d.keyword_threshold)?,
            min_contact_fields: read(&lookup, ENV_MIN_CONTACT_FIELDS, d.min_contact_fields)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_budget_secs == 0 {
            return Err(ConfigError::Zero { field: "time_budget_secs" });
        }
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Zero { field: "probe_timeout_secs" });
        }
        if self.homepage_timeout_secs == 0 {
            return Err(ConfigError::Zero { field: "homepage_timeout_secs" });
        }
        if self.liveness_timeout_secs == 0 {
            return Err(ConfigError::Zero { field: "liveness_timeout_secs" });
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn homepage_timeout(&self) -> Duration {
        Duration::from_secs(self.homepage_timeout_secs)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: usize,
    /// Slept by a worker after each target it finishes.
    pub rate_limit_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            rate_limit_delay_ms: 1000,
        }
    }
}

impl BatchConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let cfg = Self {
            batch_size: read(&lookup, ENV_BATCH_SIZE, d.batch_size)?,
            rate_limit_delay_ms: read(&lookup, ENV_RATE_LIMIT_DELAY, d.rate_limit_delay_ms)?,
        };
        if cfg.batch_size == 0 {
            return Err(ConfigError::Zero { field: "batch_size" });
        }
        Ok(cfg)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

/// Everything the service binary reads at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub discovery: DiscoveryConfig,
    pub batch: BatchConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_bind = SocketAddr::from(([0, 0, 0, 0], 8080));
        Ok(Self {
            bind: read(&lookup, ENV_BIND, default_bind)?,
            discovery: DiscoveryConfig::from_lookup(&lookup)?,
            batch: BatchConfig::from_lookup(&lookup)?,
        })
    }
}

fn read<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            var,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
