//! Application configuration.
//!
//! Settings come from an optional YAML file; every key has a default so an
//! empty (or missing) file is a valid configuration. Command-line overrides
//! are applied on top before [`AppConfig::validate`] turns the raw values
//! into the typed configs consumed by the fetcher and the pipeline.
//!
//! ```yaml
//! total_news_count: 500
//! worker_count: 4
//! max_concurrent_requests: 5
//! page_size: 100
//! max_retries: 3
//! retry_delay_ms: 1000
//! base_url: https://kudago.com/public-api/v1.4/news/
//! ```

use crate::api::ClientConfig;
use crate::error::ConfigError;
use crate::pipeline::PipelineConfig;
use crate::pipeline::partition::total_pages;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};
use url::Url;

/// Largest `page_size` the KudaGo API accepts.
pub const MAX_PAGE_SIZE: usize = 100;

pub const DEFAULT_BASE_URL: &str = "https://kudago.com/public-api/v1.4/news/";

/// Raw configuration as read from YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// How many news records to fetch in total.
    pub total_news_count: usize,
    /// Fixed size of the streaming worker pool.
    pub worker_count: usize,
    /// Permit pool size for the bulk fetch.
    pub max_concurrent_requests: usize,
    pub page_size: usize,
    /// Attempts per page, including the first one.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            total_news_count: 100,
            worker_count: 4,
            max_concurrent_requests: 5,
            page_size: MAX_PAGE_SIZE,
            max_retries: 3,
            retry_delay_ms: 1000,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Validated settings, split by the component that consumes them.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Check ranges and build the per-component configs.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        if self.worker_count == 0 {
            return Err(invalid("worker_count", "must be at least 1"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(invalid(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}, got {}", self.page_size),
            ));
        }
        if total_pages(self.total_news_count, self.page_size).is_none() {
            return Err(invalid(
                "total_news_count",
                format!(
                    "{} records at page_size {} need more than {} pages",
                    self.total_news_count,
                    self.page_size,
                    u32::MAX
                ),
            ));
        }
        if self.max_retries == 0 {
            return Err(invalid("max_retries", "must be at least 1"));
        }
        if self.max_concurrent_requests == 0 || self.max_concurrent_requests > Semaphore::MAX_PERMITS {
            return Err(invalid(
                "max_concurrent_requests",
                format!(
                    "must be between 1 and {}, got {}",
                    Semaphore::MAX_PERMITS,
                    self.max_concurrent_requests
                ),
            ));
        }
        let base_url = Url::parse(&self.base_url)?;

        Ok(Settings {
            client: ClientConfig {
                base_url,
                page_size: self.page_size,
                max_retries: self.max_retries,
                retry_delay: Duration::from_millis(self.retry_delay_ms),
                max_concurrent_requests: self.max_concurrent_requests,
            },
            pipeline: PipelineConfig {
                total_count: self.total_news_count,
                worker_count: self.worker_count,
                page_size: self.page_size,
            },
        })
    }
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: message.into(),
    }
}
