//! HTTP implementation of the page fetcher.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::SourceConfig;
use super::error::FetchError;
use super::PageFetcher;
use crate::metrics;
use crate::retry::RetryPolicy;

/// Fetches listing pages from the remote catalog API over HTTP.
///
/// Each page is one `POST` with a form-encoded body selecting the page
/// number and sort order (descending update time, so new uploads surface
/// on the first pages). Retries with backoff live inside the fetcher; the
/// caller only ever sees a body or "no data".
pub struct HttpPageFetcher {
    client: Client,
    config: SourceConfig,
    policy: RetryPolicy,
}

impl HttpPageFetcher {
    pub fn new(config: SourceConfig, policy: RetryPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            config,
            policy,
        })
    }

    /// Builds the form body for one page request.
    fn request_body(&self, page: u64) -> String {
        format!(
            "{}=update_date&{}=DESC&data_type=full&page={}&records={}",
            urlencoding::encode("sort[0][sort_by]"),
            urlencoding::encode("sort[0][sort_order]"),
            page,
            self.config.page_size
        )
    }

    async fn fetch_once(&self, page: u64) -> Result<Value, FetchError> {
        let response = self
            .client
            .post(&self.config.base_url)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")
            .header("X-Requested-With", "XMLHttpRequest")
            .body(self.request_body(page))
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::InvalidBody(e.to_string()))
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, page: u64) -> Option<Value> {
        let body = self
            .policy
            .run_with_fallback("fetch_page", None, |attempt| async move {
                if attempt > 0 {
                    metrics::FETCH_RETRIES.inc();
                }
                debug!(page, attempt, "fetching listing page");
                self.fetch_once(page).await.map(Some)
            })
            .await;

        match &body {
            Some(_) => info!(page, "listing page fetched"),
            None => warn!(page, "listing page fetch exhausted all attempts"),
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fetcher_for(url: &str) -> HttpPageFetcher {
        let config = SourceConfig {
            base_url: url.to_string(),
            ..SourceConfig::default()
        };
        HttpPageFetcher::new(config, RetryPolicy::new(2, Duration::from_millis(1))).unwrap()
    }

    #[test]
    fn test_request_body_encodes_sort_keys() {
        let fetcher = fetcher_for("http://localhost/list");
        let body = fetcher.request_body(3);
        assert!(body.contains("sort%5B0%5D%5Bsort_by%5D=update_date"));
        assert!(body.contains("sort%5B0%5D%5Bsort_order%5D=DESC"));
        assert!(body.contains("page=3"));
        assert!(body.contains("records=25"));
        assert!(body.contains("data_type=full"));
    }

    #[tokio::test]
    async fn test_fetch_page_success() {
        use wiremock::matchers::{body_string_contains, header, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .and(body_string_contains("page=1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "data": { "songs": [] }
                })),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server.uri());
        let body = fetcher.fetch_page(1).await.expect("body");
        assert!(body.get("data").is_some());
    }

    #[tokio::test]
    async fn test_fetch_page_exhaustion_returns_none() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server.uri());
        assert!(fetcher.fetch_page(1).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_page_recovers_after_transient_failure() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "data": { "songs": [] }
                })),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server.uri());
        assert!(fetcher.fetch_page(1).await.is_some());
    }
}
