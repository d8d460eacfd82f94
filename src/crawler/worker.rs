//! Worker loop
//!
//! Each worker repeatedly pops a frontier entry, runs the crawl function,
//! and finalises the entry's persistent row. Errors other than a budget
//! hit are logged and the worker moves on; a budget hit sets the stop
//! event and ends the worker.

use crate::crawler::pipeline::dispatch;
use crate::crawler::state::Admission;
use crate::crawler::{CrawlContext, FrontierEntry, PopResult};
use crate::fetch::fetch_or_cached;
use crate::{FetchError, MagpieError, Result};
use std::sync::Arc;
use std::time::Duration;

/// How long a pop waits before re-checking the stop event
const POP_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs one worker until shutdown
pub(crate) async fn run_worker(id: usize, ctx: Arc<CrawlContext>) {
    tracing::debug!("Worker {id} started");

    loop {
        if ctx.stop.is_set() {
            tracing::debug!("Worker {id} got stop event");
            break;
        }

        let entry = match ctx.frontier.pop_timeout(POP_TIMEOUT).await {
            PopResult::Entry(entry) => entry,
            PopResult::Empty => continue,
            PopResult::Closed => {
                tracing::debug!("Worker {id} got queue shutdown");
                break;
            }
        };

        tracing::debug!("Worker {id} got work {}", entry.url);

        // An entry popped after the stop event skips its dispatch; its
        // url_queue row stays behind so the next run retries it.
        let skipped = ctx.stop.is_set();
        let result = if skipped {
            Ok(())
        } else {
            crawl_page(&ctx, &entry).await
        };

        ctx.frontier.task_done();

        match result {
            Ok(()) if skipped => {}
            Ok(()) => {
                if let Err(e) = ctx.cache.finalize_pending(&entry.url) {
                    tracing::warn!("Could not finalize {} in url_queue: {e}", entry.url);
                }
            }
            Err(MagpieError::BudgetHit) => {
                // The entry stays in url_queue for the next run.
                if !ctx.stop.is_set() {
                    tracing::error!("-- Stopping iteration. Max pages hit.");
                    ctx.stop.set();
                }
                break;
            }
            Err(e) => {
                tracing::error!("ERROR EXCEPTION WHILE CRAWLING {}: {e}", entry.url);
                if let Err(e) = ctx.cache.finalize_pending(&entry.url) {
                    tracing::warn!("Could not finalize {} in url_queue: {e}", entry.url);
                }
            }
        }
    }

    tracing::debug!("Finished worker {id}");
}

/// Crawls one already-admitted frontier entry
///
/// Returns `Err(BudgetHit)` when the page budget refuses admission; other
/// errors mean this URL is dropped from the run.
pub(crate) async fn crawl_page(ctx: &CrawlContext, entry: &FrontierEntry) -> Result<()> {
    // Exactly one worker wins a given raw URL per run.
    if !ctx.visited.insert(&entry.url) {
        tracing::debug!("Skipping {}, already dispatched", entry.url);
        return Ok(());
    }

    let is_home_family = ctx.filter.is_home_family(&entry.url);
    let depth_effective = if is_home_family {
        tracing::debug!("URL is in Home Domain(s): {}", entry.url);
        0
    } else {
        tracing::debug!("URL is NOT in Home Domain(s) {}", entry.url);
        entry.depth_effective
    };

    match ctx.counter.record() {
        Admission::Admitted(_) => {}
        Admission::BudgetHit => return Err(MagpieError::BudgetHit),
    }

    tracing::info!(
        "({}/{}) CRAWLING: {}",
        entry.depth_actual,
        depth_effective,
        entry.url
    );

    let cache = ctx
        .config
        .crawler
        .cache_enabled
        .then_some(ctx.cache.as_ref());

    let page = match fetch_or_cached(cache, ctx.fetcher.as_ref(), &entry.url).await {
        Ok(page) => page,
        Err(MagpieError::Fetch(FetchError::Timeout { url })) => {
            tracing::error!("ERROR: The request for {url} timed out");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if page.status == 200 {
        dispatch(ctx, entry, &page, is_home_family, depth_effective).await
    } else {
        tracing::warn!("Broken link: {} (Status: {})", entry.url, page.status);
        handle_broken_link(ctx, &entry.url).await
    }
}

/// Archive fallback for non-success responses
///
/// Archived pages are terminal: the snapshot is written to the corpus but
/// never enters the frontier or the cache.
async fn handle_broken_link(ctx: &CrawlContext, url: &str) -> Result<()> {
    match ctx.archive.find_snapshot(url).await? {
        Some(snapshot_url) => {
            tracing::info!("Retrieving archived version from: {snapshot_url}");
            let path = ctx
                .archive
                .download_snapshot(&snapshot_url, &ctx.corpus_dir)
                .await?;
            tracing::info!("Archived artifact saved to {}", path.display());
        }
        None => {
            tracing::error!("ERROR: No archived version found for: {url}");
        }
    }
    Ok(())
}
