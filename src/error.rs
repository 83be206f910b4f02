//! Error types for the fetch pipeline.
//!
//! Three layers fail in different ways and get their own enums:
//! - [`FetchError`]: one page request against the KudaGo API
//! - [`ConfigError`]: loading or validating the YAML configuration
//! - [`PipelineError`]: coordinating the worker pool and the Markdown sink

use reqwest::StatusCode;
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::task::JoinError;

/// Failure while fetching one page of news.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with something other than `200 OK`.
    #[error("unexpected HTTP status {status} for page {page}")]
    Status { page: u32, status: StatusCode },

    /// The body did not match the page-response shape. Never retried.
    #[error("malformed response for page {page}: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    /// Every attempt failed with a retryable error.
    #[error("page {page} failed after {attempts} attempts: {last}")]
    ExhaustedRetries {
        page: u32,
        attempts: u32,
        last: Box<FetchError>,
    },

    /// The bulk plan would number pages past `u32::MAX`.
    #[error("cannot fetch {count} records at {page_size} per page: too many pages")]
    TooManyPages { count: usize, page_size: usize },

    #[error("request limiter closed: {0}")]
    LimiterClosed(#[from] AcquireError),
}

impl FetchError {
    /// Transport failures and non-200 statuses are worth another attempt;
    /// a body we cannot decode will not get better by asking again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Status { .. })
    }
}

/// Failure while loading [`crate::config::AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("invalid base_url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// Failure of a streaming pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline needs at least one worker")]
    NoWorkers,

    #[error("page size must be at least 1")]
    ZeroPageSize,

    #[error("page size {page_size} exceeds the API maximum of {max}")]
    PageSizeTooLarge { page_size: usize, max: usize },

    #[error("{total_count} records at {page_size} per page need more than u32::MAX pages")]
    TooManyPages { total_count: usize, page_size: usize },

    #[error("worker {worker} failed: {source}")]
    Worker {
        worker: usize,
        #[source]
        source: FetchError,
    },

    #[error("worker task panicked: {0}")]
    WorkerPanicked(#[source] JoinError),

    /// The sink went away while workers were still sending.
    #[error("sink stopped receiving before workers finished")]
    SinkClosed,

    #[error("sink I/O error: {0}")]
    Sink(#[from] std::io::Error),

    #[error("sink task panicked: {0}")]
    SinkPanicked(#[source] JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_retryable() {
        let err = FetchError::Status {
            page: 3,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "unexpected HTTP status 500 Internal Server Error for page 3"
        );
    }

    #[test]
    fn test_decode_is_not_retryable() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = FetchError::Decode { page: 1, source };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_exhausted_is_not_retryable() {
        let err = FetchError::ExhaustedRetries {
            page: 2,
            attempts: 3,
            last: Box::new(FetchError::Status {
                page: 2,
                status: StatusCode::BAD_GATEWAY,
            }),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().starts_with("page 2 failed after 3 attempts"));
    }

    #[test]
    fn test_planning_errors_are_not_retryable() {
        let err = FetchError::TooManyPages {
            count: 10,
            page_size: 1,
        };
        assert!(!err.is_retryable());
    }
}
