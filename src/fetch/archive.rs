use crate::url::canonicalize;
use crate::MagpieError;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Wayback Machine availability endpoint
pub const WAYBACK_API: &str = "http://archive.org/wayback/available";

/// Resolves and downloads archived snapshots for broken URLs
///
/// Archived pages are terminal artifacts: they are written to the corpus
/// under an `archived_` filename but never feed the link-extraction loop
/// and never receive a cache row.
pub struct ArchiveClient {
    client: Client,
    api: String,
}

impl ArchiveClient {
    /// Creates an archive client sharing the crawler's HTTP client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            api: WAYBACK_API.to_string(),
        }
    }

    /// Overrides the availability endpoint (for testing)
    pub fn with_api(client: Client, api: impl Into<String>) -> Self {
        Self {
            client,
            api: api.into(),
        }
    }

    /// Asks the availability service for the closest snapshot of a URL
    pub async fn find_snapshot(&self, url: &str) -> Result<Option<String>, MagpieError> {
        let response = self
            .client
            .get(&self.api)
            .query(&[("url", url)])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("No archived snapshot found for {url}");
            return Ok(None);
        }

        let payload: serde_json::Value = response.json().await?;
        let snapshot = payload
            .get("archived_snapshots")
            .and_then(|s| s.get("closest"))
            .and_then(|c| c.get("url"))
            .and_then(|u| u.as_str())
            .map(String::from);

        Ok(snapshot)
    }

    /// Downloads a snapshot into the corpus directory
    ///
    /// Returns the path of the written artifact.
    pub async fn download_snapshot(
        &self,
        snapshot_url: &str,
        corpus_dir: &Path,
    ) -> Result<PathBuf, MagpieError> {
        let response = self.client.get(snapshot_url).send().await?;
        let bytes = response.bytes().await?;

        let path = corpus_dir.join(snapshot_filename(snapshot_url));
        std::fs::write(&path, &bytes)?;

        Ok(path)
    }
}

/// Derives the artifact filename for an archived snapshot
///
/// The snapshot URL is canonicalised, its reserved characters escaped
/// (`?` → `QQ`, `=` → `EQ`, `&` → `AMP`, `/` → `_`), and the result
/// prefixed with `archived_`.
pub fn snapshot_filename(snapshot_url: &str) -> String {
    let cleaned = canonicalize(snapshot_url)
        .replace('?', "QQ")
        .replace('=', "EQ")
        .replace('&', "AMP");
    format!("archived_{}", cleaned.replace('/', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_filename_escapes_reserved_characters() {
        let name = snapshot_filename("http://web.archive.org/web/2020/page?id=7&lang=en");
        assert_eq!(
            name,
            "archived_web.archive.org_web_2020_pageQQidEQ7AMPlangEQen"
        );
    }

    #[test]
    fn test_snapshot_filename_strips_scheme_and_slash() {
        let name = snapshot_filename("https://web.archive.org/web/2020/page/");
        assert_eq!(name, "archived_web.archive.org_web_2020_page");
    }
}
