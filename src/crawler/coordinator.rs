//! Crawl coordinator
//!
//! Top-level lifecycle: create the working directories, open the cache,
//! optionally flush it, drain the persisted frontier ahead of the seed,
//! start the workers, join on the frontier, and shut down cleanly.

use crate::cache::MetaCache;
use crate::config::{Config, OutputConfig};
use crate::crawler::worker::run_worker;
use crate::crawler::{CrawlContext, Frontier, FrontierEntry, PageCounter, StopEvent, VisitedSet};
use crate::dedup::DedupRing;
use crate::extract::{PlainPdfExtractor, TagStripExtractor};
use crate::fetch::{build_fetcher, build_http_client, ArchiveClient};
use crate::url::SiteFilter;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Ensures the corpus, cache and log directories exist
///
/// Failure here is fatal: without them nothing downstream can write.
pub fn init_working_dirs(output: &OutputConfig) -> Result<()> {
    std::fs::create_dir_all(&output.corpus_dir)?;
    std::fs::create_dir_all(&output.logs_dir)?;
    if let Some(parent) = Path::new(&output.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Runs a complete crawl from the given start URL
///
/// `refresh_queue` controls whether the persisted frontier is drained into
/// the in-memory queue before the seed (the resumption path). Returns the
/// number of pages dispatched.
pub async fn crawl_site(config: Config, start_url: &str, refresh_queue: bool) -> Result<u64> {
    init_working_dirs(&config.output)?;

    let cache = Arc::new(MetaCache::open(Path::new(&config.output.db_path))?);

    if config.crawler.flush_cache_on_start {
        tracing::info!("Flushing cache on start");
        cache.clear_downloads()?;
    }

    let filter = SiteFilter::compile(&config.sites)?;
    let client = build_http_client(&config.fetch.user_agent)?;
    let fetcher = build_fetcher(client.clone(), &config.fetch);
    let archive = ArchiveClient::with_api(client, &config.fetch.wayback_api);

    let num_workers = config.crawler.num_workers;
    let corpus_dir = PathBuf::from(&config.output.corpus_dir);
    let counter = PageCounter::new(
        config.crawler.max_pages,
        config.crawler.progress_report_pages,
    );
    let frontier = Frontier::with_capacity(config.crawler.frontier_capacity);

    let ctx = Arc::new(CrawlContext {
        config,
        filter,
        cache,
        fetcher,
        archive,
        ring: DedupRing::default(),
        visited: VisitedSet::new(),
        counter,
        stop: StopEvent::new(),
        frontier,
        html_extractor: Box::new(TagStripExtractor),
        pdf_extractor: Box::new(PlainPdfExtractor),
        corpus_dir,
    });

    tracing::info!("Starting {num_workers} worker tasks...");
    let handles: Vec<_> = (1..=num_workers)
        .map(|id| tokio::spawn(run_worker(id, Arc::clone(&ctx))))
        .collect();

    // Pending URLs from the previous run go in ahead of the seed.
    if refresh_queue && ctx.config.crawler.load_pending_queue_on_start {
        let pending = ctx.cache.load_pending()?;
        if !pending.is_empty() {
            tracing::info!("Pending url_queue was refreshed with {} elements", pending.len());
            ctx.cache.clear_pending()?;
            for entry in pending {
                enqueue(&ctx, entry).await?;
            }
        }
    }

    let seed = FrontierEntry::seed(start_url);
    tracing::debug!("Adding url_to_crawl: {}", seed.url);
    enqueue(&ctx, seed).await?;

    tracing::info!("Waiting for the frontier to drain...");
    join_frontier(&ctx).await;

    ctx.stop.set();
    ctx.frontier.close();

    tracing::info!("Waiting for worker tasks to join...");
    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("Workers completed.");

    let visited = ctx.counter.count();
    tracing::info!("** Parallel web crawl finished, visited num pages: {visited}");
    Ok(visited)
}

/// Records an entry in the persistent queue and the in-memory frontier
async fn enqueue(ctx: &CrawlContext, entry: FrontierEntry) -> Result<()> {
    ctx.cache.enqueue_pending(&entry)?;
    ctx.frontier.push(entry).await;
    Ok(())
}

/// Waits until all frontier entries are handled or the stop event fires
///
/// Doubles as the progress reporter: the counter's thresholds are checked
/// on every tick so a line appears every N pages.
async fn join_frontier(ctx: &CrawlContext) {
    loop {
        if let Some(count) = ctx.counter.take_report() {
            tracing::info!("Webcrawler crawled {count} number of pages.");
        }

        if ctx.frontier.unfinished() == 0 {
            break;
        }

        if ctx.stop.is_set() {
            break;
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_working_dirs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            corpus_dir: dir.path().join("corpus").to_string_lossy().into_owned(),
            db_path: dir
                .path()
                .join("db_cache/meta_cache.db")
                .to_string_lossy()
                .into_owned(),
            logs_dir: dir.path().join("logs").to_string_lossy().into_owned(),
        };

        init_working_dirs(&output).unwrap();

        assert!(dir.path().join("corpus").is_dir());
        assert!(dir.path().join("db_cache").is_dir());
        assert!(dir.path().join("logs").is_dir());
    }
}
