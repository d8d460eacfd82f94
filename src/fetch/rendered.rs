use crate::config::FetchConfig;
use crate::fetch::{DirectFetcher, FetchResponse, Fetcher};
use crate::FetchError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Rendered fetch strategy
///
/// A HEAD request discovers the content type first. PDFs fall through to
/// the direct strategy (a browser cannot hand back raw PDF bytes); HTML is
/// loaded in a headless Chromium page and the DOM is serialised after
/// navigation settles, so script-built markup is visible to the pipeline.
///
/// The reported status is the HEAD status: the CDP session does not expose
/// the main document response cheaply, and a non-2xx HEAD short-circuits
/// without ever launching the browser.
pub struct RenderedFetcher {
    client: Client,
    direct: DirectFetcher,
    timeout: Duration,
}

impl RenderedFetcher {
    /// Creates a rendered fetcher from the fetch configuration
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client: client.clone(),
            direct: DirectFetcher::new(client, config),
            timeout: Duration::from_secs(config.render_timeout_secs),
        }
    }

    /// Navigates a headless browser page and returns the serialised DOM
    async fn render(&self, url: &str) -> Result<String, String> {
        let browser_config = BrowserConfig::builder().build()?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| e.to_string())?;

        // The handler must be polled for the browser connection to make
        // progress.
        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let navigation = async {
            let page = browser.new_page(url).await.map_err(|e| e.to_string())?;
            page.wait_for_navigation().await.map_err(|e| e.to_string())?;
            page.content().await.map_err(|e| e.to_string())
        };

        let result = match tokio::time::timeout(self.timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(format!("navigation timed out after {:?}", self.timeout)),
        };

        let _ = browser.close().await;
        driver.abort();

        result
    }
}

#[async_trait]
impl Fetcher for RenderedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let head = self
            .client
            .head(url)
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

        let status = head.status().as_u16();
        let content_type = head
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("application/pdf") {
            tracing::debug!("{url} is PDF, falling through to direct fetch");
            return self.direct.fetch(url).await;
        }

        if !(200..300).contains(&status) {
            return Ok(FetchResponse {
                status,
                content_type,
                body: Vec::new(),
            });
        }

        let html = self
            .render(url)
            .await
            .map_err(|message| FetchError::Render {
                url: url.to_string(),
                message,
            })?;

        let content_type = if content_type.is_empty() {
            "text/html".to_string()
        } else {
            content_type
        };

        Ok(FetchResponse {
            status,
            content_type,
            body: html.into_bytes(),
        })
    }
}
