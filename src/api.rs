//! KudaGo news API client with fixed-delay retry.
//!
//! The pipeline only sees the [`PageSource`] trait, so workers can be driven
//! by the real HTTP client or by an in-memory source in tests.
//!
//! # Failure policy
//!
//! Transport errors and non-200 statuses are retried up to `max_retries`
//! attempts in total, sleeping `retry_delay` between attempts. What happens
//! after the last attempt depends on the entry point:
//! - [`PageSource::fetch_page`] (streaming): the page contributes no records
//! - [`KudaGoClient::fetch_all`] (bulk): the whole batch is discarded
//!
//! A body that does not decode as a page response is a contract violation
//! and is returned as [`FetchError::Decode`] on both paths without retrying.

use crate::error::FetchError;
use crate::limiter::RequestLimiter;
use crate::models::{News, NewsPage};
use crate::pipeline::partition::{PageRequest, page_plan};
use crate::utils::truncate_for_log;
use futures::future::try_join_all;
use reqwest::StatusCode;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

const NEWS_FIELDS: &str =
    "id,title,place,description,site_url,favorites_count,comments_count,publication_date";

/// Query parameters sent with every page request, before `page_size`/`page`.
const NEWS_QUERY: [(&str, &str); 4] = [
    ("location", "msk"),
    ("text_format", "text"),
    ("expand", "place"),
    ("fields", NEWS_FIELDS),
];

/// Anything that can produce one page of news.
///
/// Implementations must absorb transient failures themselves: an `Err` from
/// `fetch_page` is treated as fatal for the worker that called it.
pub trait PageSource: Send + Sync + 'static {
    fn fetch_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Vec<News>, FetchError>> + Send;
}

/// Settings for [`KudaGoClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Page size used by the bulk plan.
    pub page_size: usize,
    /// Total attempts per page, including the first.
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Permit pool size for [`KudaGoClient::fetch_all`].
    pub max_concurrent_requests: usize,
}

/// HTTP client for the KudaGo `news` endpoint.
#[derive(Debug, Clone)]
pub struct KudaGoClient {
    http: reqwest::Client,
    config: ClientConfig,
    limiter: RequestLimiter,
}

impl KudaGoClient {
    pub fn new(http: reqwest::Client, config: ClientConfig) -> Self {
        let limiter = RequestLimiter::new(config.max_concurrent_requests);
        Self {
            http,
            config,
            limiter,
        }
    }

    /// One GET, no retry.
    async fn request_page(&self, page: u32, page_size: usize) -> Result<NewsPage, FetchError> {
        let response = self
            .http
            .get(self.config.base_url.clone())
            .query(&NEWS_QUERY)
            .query(&[("page_size", page_size)])
            .query(&[("page", page)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status { page, status });
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<NewsPage>(&body).map_err(|source| {
            warn!(
                page,
                error = %source,
                body_preview = %truncate_for_log(&String::from_utf8_lossy(&body), 300),
                "Response does not match the page shape"
            );
            FetchError::Decode { page, source }
        })
    }

    /// Request a page, retrying retryable failures with a fixed delay.
    ///
    /// Makes at most `max_retries` attempts and sleeps only between them.
    #[instrument(level = "debug", skip(self))]
    pub async fn retry_request(&self, page: u32, page_size: usize) -> Result<NewsPage, FetchError> {
        let t0 = Instant::now();
        let max = self.config.max_retries.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(page, page_size, attempt, "Requesting page");
            match self.request_page(page, page_size).await {
                Ok(resp) => {
                    debug!(
                        page,
                        attempt,
                        results = resp.results.len(),
                        total = resp.count,
                        has_next = resp.next.is_some(),
                        has_previous = resp.previous.is_some(),
                        "Fetched page"
                    );
                    return Ok(resp);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempt >= max {
                        error!(
                            page,
                            attempt,
                            max,
                            elapsed_ms_total = t0.elapsed().as_millis(),
                            error = %e,
                            "Page request exhausted retries"
                        );
                        return Err(FetchError::ExhaustedRetries {
                            page,
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    warn!(
                        page,
                        attempt,
                        max,
                        delay = ?self.config.retry_delay,
                        error = %e,
                        "Page request failed; retrying"
                    );
                    sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    /// Fetch exactly `count` records up front, `max_concurrent_requests` pages at a time.
    ///
    /// Records come back in page order. If any page exhausts its retries the
    /// whole batch is dropped and an empty list is returned.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_all(&self, count: usize) -> Result<Vec<News>, FetchError> {
        let page_size = self.config.page_size;
        let Some(plan) = page_plan(count, page_size) else {
            return Err(FetchError::TooManyPages { count, page_size });
        };
        let pages = plan.len();
        info!(
            pages,
            page_size,
            max_in_flight = self.limiter.capacity(),
            "Starting bulk fetch"
        );

        let t0 = Instant::now();
        match try_join_all(plan.into_iter().map(|req| self.fetch_planned(req))).await {
            Ok(pages) => {
                let news: Vec<News> = pages.into_iter().flatten().collect();
                info!(
                    count = news.len(),
                    elapsed_ms = t0.elapsed().as_millis(),
                    "Bulk fetch completed"
                );
                Ok(news)
            }
            Err(e @ FetchError::ExhaustedRetries { .. }) => {
                error!(error = %e, "Bulk fetch aborted; discarding every fetched page");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_planned(&self, req: PageRequest) -> Result<Vec<News>, FetchError> {
        let _permit = self.limiter.acquire().await?;
        debug!(page = req.page, free_permits = self.limiter.available(), "Acquired request permit");
        Ok(self.retry_request(req.page, req.size).await?.results)
    }
}

impl PageSource for KudaGoClient {
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<Vec<News>, FetchError> {
        match self.retry_request(page, page_size).await {
            Ok(resp) => Ok(resp.results),
            Err(e @ FetchError::ExhaustedRetries { .. }) => {
                error!(page, error = %e, "Skipping page; it contributes no records");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::sample_news;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, page_size: usize) -> KudaGoClient {
        let config = ClientConfig {
            base_url: Url::parse(&format!("{}/news/", server.uri())).unwrap(),
            page_size,
            max_retries: 3,
            retry_delay: Duration::from_millis(5),
            max_concurrent_requests: 2,
        };
        KudaGoClient::new(reqwest::Client::new(), config)
    }

    fn page_body(ids: &[u64]) -> serde_json::Value {
        serde_json::json!({
            "count": 10,
            "next": null,
            "previous": null,
            "results": ids.iter().map(|id| sample_news(*id)).collect::<Vec<_>>(),
        })
    }

    #[tokio::test]
    async fn test_fetch_page_success_sends_fixed_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/"))
            .and(query_param("location", "msk"))
            .and(query_param("text_format", "text"))
            .and(query_param("expand", "place"))
            .and(query_param("fields", NEWS_FIELDS))
            .and(query_param("page", "1"))
            .and(query_param("page_size", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[1, 2])))
            .expect(1)
            .mount(&server)
            .await;

        let news = client_for(&server, 2).fetch_page(1, 2).await.unwrap();
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].id, 1);
        assert_eq!(news[0].title, "News 1");
        assert_eq!(news[1].id, 2);
    }

    #[tokio::test]
    async fn test_fetch_page_empty_after_exhausting_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let news = client_for(&server, 2).fetch_page(1, 2).await.unwrap();
        assert!(news.is_empty());
    }

    #[tokio::test]
    async fn test_retry_then_succeed_on_third_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[1])))
            .expect(1)
            .mount(&server)
            .await;

        let news = client_for(&server, 1).fetch_page(1, 1).await.unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].id, 1);
    }

    #[tokio::test]
    async fn test_retry_request_reports_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(3)
            .mount(&server)
            .await;

        let err = client_for(&server, 2).retry_request(4, 2).await.unwrap_err();
        match err {
            FetchError::ExhaustedRetries { page, attempts, last } => {
                assert_eq!(page, 4);
                assert_eq!(attempts, 3);
                assert!(matches!(*last, FetchError::Status { status, .. } if status == StatusCode::NOT_FOUND));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 2).fetch_page(1, 2).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { page: 1, .. }));
    }

    #[tokio::test]
    async fn test_fetch_all_combines_pages_in_order() {
        let server = MockServer::start().await;
        for (page, size, ids) in [("1", "2", vec![1, 2]), ("2", "2", vec![3, 4]), ("3", "1", vec![5])] {
            Mock::given(method("GET"))
                .and(query_param("page", page))
                .and(query_param("page_size", size))
                .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&ids)))
                .expect(1)
                .mount(&server)
                .await;
        }

        let news = client_for(&server, 2).fetch_all(5).await.unwrap();
        let ids: Vec<u64> = news.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_fetch_all_discards_everything_on_exhaustion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[1, 2])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let news = client_for(&server, 2).fetch_all(4).await.unwrap();
        assert!(news.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_requests_within_permit_pool() {
        let server = MockServer::start().await;
        let delay = Duration::from_millis(150);
        for page in 1..=4u64 {
            Mock::given(method("GET"))
                .and(query_param("page", page.to_string()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(page_body(&[page]))
                        .set_delay(delay),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        // Two permits for four slow pages: at least two rounds of `delay`.
        let client = client_for(&server, 1);
        let t0 = Instant::now();
        let news = client.fetch_all(4).await.unwrap();
        let elapsed = t0.elapsed();

        let ids: Vec<u64> = news.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(elapsed >= delay * 2, "finished in {elapsed:?}");
        assert_eq!(client.limiter.available(), 2);
    }

    #[cfg(target_pointer_width = "64")]
    #[tokio::test]
    async fn test_fetch_all_rejects_count_beyond_page_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[])))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server, 1).fetch_all(u32::MAX as usize + 6).await.unwrap_err();
        assert!(matches!(err, FetchError::TooManyPages { page_size: 1, .. }));
    }

    #[tokio::test]
    async fn test_fetch_all_zero_count_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[])))
            .expect(0)
            .mount(&server)
            .await;

        let news = client_for(&server, 2).fetch_all(0).await.unwrap();
        assert!(news.is_empty());
    }
}
