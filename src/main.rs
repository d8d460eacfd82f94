//! Magpie main entry point
//!
//! Command-line interface for the corpus harvesting crawler.

use clap::Parser;
use magpie::config::{default_config, load_config};
use magpie::crawler::crawl_site;
use magpie::url::ensure_scheme;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Name of the log file inside the configured logs directory
const LOG_FILE_NAME: &str = "scraper.log";

/// Magpie: a domain-scoped corpus harvesting crawler
///
/// Magpie crawls an allow-listed family of websites, writes paired
/// raw/plain-text artifacts to the corpus directory, and persists its
/// frontier so an interrupted crawl resumes on the next start.
#[derive(Parser, Debug)]
#[command(name = "magpie")]
#[command(version = "1.0.0")]
#[command(about = "A domain-scoped corpus harvesting crawler", long_about = None)]
struct Cli {
    /// Start URL; http:// is assumed when no scheme is given
    #[arg(value_name = "START_URL")]
    start_url: Option<String>,

    /// Stop after this many pages; 0 means unlimited
    #[arg(value_name = "MAX_PAGES")]
    max_pages: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Wipe cached download metadata before crawling
    #[arg(long)]
    fresh: bool,

    /// Skip draining the persisted frontier from the previous run
    #[arg(long)]
    no_resume: bool,

    /// Log to stderr instead of the log file
    #[arg(long)]
    stderr: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    std::fs::create_dir_all(&config.output.logs_dir)?;
    setup_logging(&config.output.logs_dir, cli.verbose, cli.quiet, cli.stderr)?;

    if cli.fresh {
        config.crawler.flush_cache_on_start = true;
    }

    if let Some(max_pages) = cli.max_pages {
        tracing::info!("Found new max_pages to crawl setting {max_pages}");
        config.crawler.max_pages = max_pages;
    }

    // A start URL on the command line targets a fresh site; the pending
    // queue from the previous run is left alone in that case.
    let mut refresh_queue = !cli.no_resume;
    let start_url = match &cli.start_url {
        Some(url) => {
            let url = ensure_scheme(url);
            tracing::info!("Override start url {url}");
            refresh_queue = false;
            url
        }
        None => config.sites.seed_url.clone(),
    };

    tracing::info!("*** CRAWL SITE BEGIN at url: {start_url}");

    let visited = crawl_site(config, &start_url, refresh_queue).await?;

    tracing::info!("*** CRAWL SITE END");
    println!("Visited {visited} pages");

    Ok(())
}

/// Sets up the tracing subscriber
///
/// Output goes to `<logs-dir>/scraper.log` unless `--stderr` is given.
fn setup_logging(
    logs_dir: &str,
    verbose: u8,
    quiet: bool,
    to_stderr: bool,
) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("magpie=info,warn"),
            1 => EnvFilter::new("magpie=debug,info"),
            2 => EnvFilter::new("magpie=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    if to_stderr {
        builder.with_writer(std::io::stderr).init();
    } else {
        let log_path = Path::new(logs_dir).join(LOG_FILE_NAME);
        let file = std::fs::File::create(&log_path)?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }

    Ok(())
}
