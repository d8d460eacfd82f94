//! The crawl engine
//!
//! Frontier, worker pool, shared run state, content pipelines, and the
//! coordinator that ties their lifecycles together.

mod coordinator;
mod frontier;
mod parser;
mod pipeline;
mod state;
mod worker;

pub use coordinator::{crawl_site, init_working_dirs};
pub use frontier::{Frontier, FrontierEntry, PopResult};
pub use parser::extract_links;
pub use pipeline::{classify_content, content_hash, digest_hex, ContentKind, AD_SCRIPT_CDN};
pub use state::{Admission, PageCounter, StopEvent, VisitedSet};

use crate::cache::MetaCache;
use crate::config::Config;
use crate::dedup::DedupRing;
use crate::extract::{HtmlExtractor, PdfExtractor};
use crate::fetch::{ArchiveClient, Fetcher};
use crate::url::SiteFilter;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a worker needs, shared behind one `Arc`
///
/// The individual fields carry their own locking; the context itself is
/// immutable for the duration of a run.
pub struct CrawlContext {
    pub config: Config,
    pub filter: SiteFilter,
    pub cache: Arc<MetaCache>,
    pub fetcher: Arc<dyn Fetcher>,
    pub archive: ArchiveClient,
    pub ring: DedupRing,
    pub visited: VisitedSet,
    pub counter: PageCounter,
    pub stop: StopEvent,
    pub frontier: Frontier,
    pub html_extractor: Box<dyn HtmlExtractor>,
    pub pdf_extractor: Box<dyn PdfExtractor>,
    pub corpus_dir: PathBuf,
}
