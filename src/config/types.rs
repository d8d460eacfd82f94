use serde::Deserialize;

/// Main configuration structure for magpie
///
/// Every section and field has a compiled-in default, so the crawler runs
/// without a configuration file at all.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sites: SitesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Maximum effective depth before child links stop being enumerated
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Stop after this many pages; 0 disables the budget
    #[serde(default)]
    pub max_pages: u64,

    /// Number of worker tasks draining the frontier
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Frontier queue capacity; enqueue waits when full
    #[serde(default = "default_frontier_capacity")]
    pub frontier_capacity: usize,

    /// Emit a progress log line every N pages
    #[serde(default = "default_progress_report_pages")]
    pub progress_report_pages: u64,

    /// Route application/pdf responses through the PDF pipeline
    #[serde(default = "default_true")]
    pub process_pdfs: bool,

    /// Write .html/.txt artifact pairs (disable for a dry traversal)
    #[serde(default = "default_true")]
    pub save_html_content: bool,

    /// Consult and update the metadata cache
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Wipe the downloads table before crawling
    #[serde(default)]
    pub flush_cache_on_start: bool,

    /// Drain the persisted url_queue into the frontier ahead of the seed
    #[serde(default = "default_true")]
    pub load_pending_queue_on_start: bool,
}

/// Fetch strategy selection and HTTP surface
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FetchConfig {
    /// Which strategy retrieves page bytes
    #[serde(default)]
    pub strategy: FetchStrategy,

    /// User-Agent header sent on every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout for the direct strategy, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Navigation timeout for the rendered strategy, in seconds
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,

    /// How many times an HTTP 429 is retried before giving up
    #[serde(default = "default_ratelimit_retries")]
    pub ratelimit_retries: u32,

    /// Delay between rate-limit retries, in milliseconds
    #[serde(default = "default_ratelimit_retry_millis")]
    pub ratelimit_retry_millis: u64,

    /// Archive availability endpoint consulted for broken links
    #[serde(default = "default_wayback_api")]
    pub wayback_api: String,
}

/// Fetch strategy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    /// Plain HTTP GET
    #[default]
    Direct,
    /// HEAD to discover the content type, then a headless browser for HTML
    Rendered,
}

/// The home-family allow-list, the deny-list, and the default seed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SitesConfig {
    /// Seed URL used when none is given on the command line
    #[serde(default = "default_seed_url")]
    pub seed_url: String,

    /// Domains whose pages have their child links enumerated
    #[serde(default = "default_home_family")]
    pub home_family: Vec<String>,

    /// Regex fragments; any match rejects the URL outright
    #[serde(default = "default_deny_patterns")]
    pub deny_patterns: Vec<String>,
}

/// Filesystem layout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory receiving .html/.pdf/.txt artifact pairs
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: String,

    /// Path of the metadata cache database
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Directory receiving the crawl log
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_pages: 0,
            num_workers: default_num_workers(),
            frontier_capacity: default_frontier_capacity(),
            progress_report_pages: default_progress_report_pages(),
            process_pdfs: true,
            save_html_content: true,
            cache_enabled: true,
            flush_cache_on_start: false,
            load_pending_queue_on_start: true,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            strategy: FetchStrategy::Direct,
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            render_timeout_secs: default_render_timeout(),
            ratelimit_retries: default_ratelimit_retries(),
            ratelimit_retry_millis: default_ratelimit_retry_millis(),
            wayback_api: default_wayback_api(),
        }
    }
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            seed_url: default_seed_url(),
            home_family: default_home_family(),
            deny_patterns: default_deny_patterns(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            db_path: default_db_path(),
            logs_dir: default_logs_dir(),
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_num_workers() -> usize {
    8
}

fn default_frontier_capacity() -> usize {
    10_000
}

fn default_progress_report_pages() -> u64 {
    25
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "AiBot/1.0".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_render_timeout() -> u64 {
    60
}

fn default_ratelimit_retries() -> u32 {
    3
}

fn default_ratelimit_retry_millis() -> u64 {
    100
}

fn default_wayback_api() -> String {
    "http://archive.org/wayback/available".to_string()
}

fn default_seed_url() -> String {
    "http://www.momentoflove.org".to_string()
}

fn default_corpus_dir() -> String {
    "./corpus/".to_string()
}

fn default_db_path() -> String {
    "./db_cache/meta_cache.db".to_string()
}

fn default_logs_dir() -> String {
    "./logs/".to_string()
}

/// The deployed allow-list of home-family domains
fn default_home_family() -> Vec<String> {
    [
        "wanttoknow.info",
        "momentoflove.org",
        "weboflove.org",
        "newsarticles.media",
        "divinemystery.net",
        "inspiringcommunity.org",
        "wisdomcourses.net",
        "inspirationcourse.net",
        "hidden-knowledge.net",
        "insightcourse.net",
        "transformationteam.net",
        "martintruther.com",
        "gatheringspot.net",
        "usrtk.org",
        "newparadigminstitute.org",
        "responsibletechnology.org",
        "theblackvault.com",
        "farsight.org",
        "childrenshealthdefense.org",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Regex fragments matched case-insensitively against candidate URLs
fn default_deny_patterns() -> Vec<String> {
    [
        r"^javascript:",
        r"^mailto:",
        r"amazon\.com",
        r"youtube\.com",
        r"youtu\.be",
        r"instagram\.com",
        r"facebook\.com",
        r"tiktok\.com",
        r"twitter\.com",
        r"x\.com",
        r"linkedin\.com",
        r"reddit\.com",
        r"pinterest\.com",
        r"snapchat\.com",
        r"nytimes\.com",
        r"washingtontimes\.com",
        r"cnn\.com",
        r"foxnews\.com",
        r"nbcnews\.com",
        r"abcnews\.go\.com",
        r"example\.com",
        r"example\.org",
        r"rumble\.com",
        r"redirect",
        r"sign-in",
        r"wa\.me",
        r"tel:\+",
        r"\.gov\b",
        r"\.mil\b",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
