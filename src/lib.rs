//! Magpie: a domain-scoped corpus harvesting crawler
//!
//! This crate implements a multi-worker web crawler that harvests an
//! allow-listed family of websites, deduplicates content across retrievals,
//! and writes paired raw/plain-text artifacts suitable for language-model
//! corpus ingestion. The frontier is mirrored to disk so an interrupted
//! crawl resumes where it left off.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod url;

use thiserror::Error;

/// Main error type for magpie operations
#[derive(Debug, Error)]
pub enum MagpieError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("PDF extraction failed for {path}: {message}")]
    PdfExtract { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised out of the crawl function when the page budget is exhausted.
    /// This is a stop condition, not a failure; workers translate it into
    /// the stop event.
    #[error("Page budget exhausted")]
    BudgetHit,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid site pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Errors raised by fetch strategies
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Rendered fetch failed for {url}: {message}")]
    Render { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for magpie operations
pub type Result<T> = std::result::Result<T, MagpieError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::MetaCache;
pub use config::Config;
pub use dedup::DedupRing;
pub use url::{canonicalize, SiteFilter};
