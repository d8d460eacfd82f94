//! Fetch strategies
//!
//! A fetcher turns a URL into `(status, content-type, bytes)`. Two
//! strategies exist behind the [`Fetcher`] trait: a direct HTTP GET and a
//! rendered fetch that drives a headless browser for HTML. The
//! [`fetch_or_cached`] wrapper consults the metadata cache first and tags
//! the result with `was_cached` so the pipeline knows whether to rewrite
//! artifacts.

mod archive;
mod direct;
mod rendered;

pub use archive::{snapshot_filename, ArchiveClient, WAYBACK_API};
pub use direct::DirectFetcher;
pub use rendered::RenderedFetcher;

use crate::cache::MetaCache;
use crate::config::{FetchConfig, FetchStrategy};
use crate::url::canonicalize;
use crate::{FetchError, MagpieError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Raw result of a fetch strategy
#[derive(Debug)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, possibly empty
    pub content_type: String,
    /// Response body
    pub body: Vec<u8>,
}

/// A fetch strategy
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves the URL, returning status, content type and bytes
    ///
    /// Non-2xx statuses are returned, not raised; only transport-level
    /// failures surface as errors.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Page content as seen by the pipeline, indexed by canonical URL
#[derive(Debug)]
pub struct PageContent {
    /// Canonical URL the cache and artifacts key on
    pub cleaned_url: String,
    pub status: u16,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// True when the bytes came from the cache rather than the network
    pub was_cached: bool,
}

/// Builds the shared HTTP client
///
/// Redirects follow reqwest's default policy; there is no cookie or auth
/// surface. Per-request timeouts are applied by the strategies.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Constructs the configured fetch strategy
pub fn build_fetcher(client: Client, config: &FetchConfig) -> Arc<dyn Fetcher> {
    match config.strategy {
        FetchStrategy::Direct => Arc::new(DirectFetcher::new(client, config)),
        FetchStrategy::Rendered => Arc::new(RenderedFetcher::new(client, config)),
    }
}

/// Returns cached bytes when the cache holds a valid entry, otherwise
/// fetches over the network
///
/// The result is always keyed by the canonical URL so downstream stages
/// never index on the raw form. Cached responses report status 200.
pub async fn fetch_or_cached(
    cache: Option<&MetaCache>,
    fetcher: &dyn Fetcher,
    url: &str,
) -> Result<PageContent, MagpieError> {
    let cleaned_url = canonicalize(url);

    if let Some(cache) = cache {
        if let Some(hit) = cache.lookup(&cleaned_url)? {
            tracing::debug!("{cleaned_url} retrieved from cache");
            return Ok(PageContent {
                cleaned_url,
                status: 200,
                content_type: hit.content_type,
                bytes: hit.bytes,
                was_cached: true,
            });
        }
        tracing::debug!("{cleaned_url} not in cache, fetching");
    }

    let response = fetcher.fetch(url).await?;
    Ok(PageContent {
        cleaned_url,
        status: response.status,
        content_type: response.content_type,
        bytes: response.body,
        was_cached: false,
    })
}
