use crate::config::FetchConfig;
use crate::fetch::{FetchResponse, Fetcher};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Direct HTTP GET strategy
///
/// One request per URL with a per-request timeout. HTTP 429 is retried a
/// configured number of times with a short delay; every other status is
/// handed back to the caller untouched.
pub struct DirectFetcher {
    client: Client,
    timeout: Duration,
    ratelimit_retries: u32,
    ratelimit_delay: Duration,
}

impl DirectFetcher {
    /// Creates a direct fetcher from the fetch configuration
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(config.request_timeout_secs),
            ratelimit_retries: config.ratelimit_retries,
            ratelimit_delay: Duration::from_millis(config.ratelimit_retry_millis),
        }
    }
}

#[async_trait]
impl Fetcher for DirectFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let mut attempt = 0;

        loop {
            let response = self
                .client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        FetchError::Timeout {
                            url: url.to_string(),
                        }
                    } else {
                        FetchError::Http {
                            url: url.to_string(),
                            source: e,
                        }
                    }
                })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.ratelimit_retries {
                attempt += 1;
                tracing::debug!(
                    "Rate limited on {url}, retry {attempt}/{} after {:?}",
                    self.ratelimit_retries,
                    self.ratelimit_delay
                );
                tokio::time::sleep(self.ratelimit_delay).await;
                continue;
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::Http {
                    url: url.to_string(),
                    source: e,
                })?
                .to_vec();

            return Ok(FetchResponse {
                status: status.as_u16(),
                content_type,
                body,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(retries: u32) -> DirectFetcher {
        let config = FetchConfig {
            ratelimit_retries: retries,
            ratelimit_retry_millis: 10,
            ..FetchConfig::default()
        };
        let client = crate::fetch::build_http_client(&config.user_agent).unwrap();
        DirectFetcher::new(client, &config)
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>hi</html>", "text/html"),
            )
            .mount(&server)
            .await;

        let response = test_fetcher(0)
            .fetch(&format!("{}/page", server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "text/html");
        assert_eq!(response.body, b"<html>hi</html>");
    }

    #[tokio::test]
    async fn test_fetch_passes_through_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let response = test_fetcher(0)
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_fetch_retries_429() {
        let server = MockServer::start().await;
        // First two attempts are rate limited, then the page succeeds.
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let response = test_fetcher(3)
            .fetch(&format!("{}/limited", server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"ok");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let response = test_fetcher(2)
            .fetch(&format!("{}/limited", server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 429);
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        // Nothing listens on this port.
        let result = test_fetcher(0).fetch("http://127.0.0.1:1/page").await;
        assert!(matches!(result, Err(FetchError::Http { .. })));
    }
}
