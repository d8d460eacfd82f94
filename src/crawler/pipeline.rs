//! Content dispatch and the HTML/PDF pipelines
//!
//! A fetched page is routed by content type. HTML is normalised, hashed,
//! checked against the dedup ring, persisted as an artifact pair, and
//! mined for child links under the child-link policy. PDF is persisted
//! and handed to the pluggable extractor. Everything else is logged and
//! dropped.

use crate::cache::CacheEntry;
use crate::crawler::parser::extract_links;
use crate::crawler::{CrawlContext, FrontierEntry};
use crate::extract::format_text_artifact;
use crate::fetch::PageContent;
use crate::url::{artifact_stem, should_visit};
use crate::Result;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};
use url::Url;

/// Substring identifying third-party ad/analytics script hosts that are
/// removed from the DOM before hashing and persistence
pub const AD_SCRIPT_CDN: &str = "substackcdn";

/// Where the dispatcher routes a response
#[derive(Debug, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Pdf,
    /// Recognised but deliberately not processed
    Ignored(&'static str),
    Unsupported,
}

/// Classifies a Content-Type header value
pub fn classify_content(content_type: &str, process_pdfs: bool) -> ContentKind {
    if process_pdfs && content_type.contains("application/pdf") {
        return ContentKind::Pdf;
    }
    if content_type.contains("text/html") {
        return ContentKind::Html;
    }
    if content_type.contains("application/xml") || content_type.contains("text/xml") {
        return ContentKind::Ignored("XML");
    }
    if content_type.contains("text/css") {
        return ContentKind::Ignored("CSS");
    }
    if content_type.contains("application/javascript") || content_type.contains("text/javascript")
    {
        return ContentKind::Ignored("Javascript");
    }
    if content_type.contains("image/jpeg") {
        return ContentKind::Ignored("JPEG image");
    }
    if content_type.contains("image/png") {
        return ContentKind::Ignored("PNG image");
    }
    if content_type.contains("image/gif") {
        return ContentKind::Ignored("GIF image");
    }
    if content_type.contains("application/vnd.ms-powerpoint") {
        return ContentKind::Ignored("PPT Powerpoint");
    }
    ContentKind::Unsupported
}

/// Hex SHA-256 digest of raw bytes
pub fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Content hash of a normalised HTML body
///
/// Leading/trailing whitespace is trimmed and the bytes lowercased before
/// hashing, so formatting-only differences between servings of the same
/// page collapse to one digest.
pub fn content_hash(normalized: &[u8]) -> String {
    let start = normalized
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(normalized.len());
    let end = normalized
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    digest_hex(&normalized[start..end].to_ascii_lowercase())
}

/// Outcome of the synchronous DOM stage of the HTML pipeline
struct HtmlAnalysis {
    normalized: String,
    hash: String,
    links: Vec<String>,
}

/// Parses, adjusts and serialises an HTML body in one synchronous pass
///
/// Link enumeration only happens when the child-link policy already
/// allowed it; the parsed DOM never crosses an await point.
fn analyze_html(body: &str, link_base: Option<&Url>) -> HtmlAnalysis {
    let mut document = Html::parse_document(body);

    strip_ad_scripts(&mut document);

    let links = match link_base {
        Some(base) => extract_links(&document, base),
        None => Vec::new(),
    };

    let normalized = document.html();
    let hash = content_hash(normalized.as_bytes());

    HtmlAnalysis {
        normalized,
        hash,
        links,
    }
}

/// Removes third-party script tags whose src points at the ad CDN
fn strip_ad_scripts(document: &mut Html) {
    let Ok(selector) = Selector::parse("script[src]") else {
        return;
    };

    let doomed: Vec<_> = document
        .select(&selector)
        .filter(|el| {
            el.value()
                .attr("src")
                .is_some_and(|src| src.contains(AD_SCRIPT_CDN))
        })
        .map(|el| el.id())
        .collect();

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Routes a successful response into the matching pipeline
pub(crate) async fn dispatch(
    ctx: &CrawlContext,
    entry: &FrontierEntry,
    page: &PageContent,
    is_home_family: bool,
    depth_effective: u32,
) -> Result<()> {
    match classify_content(&page.content_type, ctx.config.crawler.process_pdfs) {
        ContentKind::Pdf => {
            tracing::info!("File appears to be PDF {}", entry.url);
            process_pdf(ctx, page)
        }
        ContentKind::Html => {
            tracing::debug!("File appears to be HTML {}", entry.url);
            process_html(ctx, entry, page, is_home_family, depth_effective).await
        }
        ContentKind::Ignored(kind) => {
            tracing::debug!("File appears to be {kind} {}", entry.url);
            Ok(())
        }
        ContentKind::Unsupported => {
            tracing::debug!(
                "Skipping unsupported content type '{}': {}",
                page.content_type,
                entry.url
            );
            Ok(())
        }
    }
}

/// The HTML pipeline
///
/// Order matters: the dedup ring is consulted after normalisation but
/// before any artifact write, so a duplicate served under a second URL
/// produces nothing at all.
pub(crate) async fn process_html(
    ctx: &CrawlContext,
    entry: &FrontierEntry,
    page: &PageContent,
    is_home_family: bool,
    depth_effective: u32,
) -> Result<()> {
    let expand_links = is_home_family && depth_effective < ctx.config.crawler.max_depth;

    let link_base = if expand_links {
        match Url::parse(&entry.url) {
            Ok(base) => Some(base),
            Err(e) => {
                tracing::warn!("Cannot resolve children of {}: {e}", entry.url);
                None
            }
        }
    } else {
        None
    };

    let body = String::from_utf8_lossy(&page.bytes);
    let analysis = analyze_html(&body, link_base.as_ref());

    if ctx.ring.check_and_insert(&analysis.hash) {
        tracing::debug!(
            "Already seen content for url: {}. No more processing done.",
            entry.url
        );
        return Ok(());
    }
    tracing::debug!("Added hash {} to seen content for {}", analysis.hash, entry.url);

    let stem = artifact_stem(&page.cleaned_url);
    let html_path = ctx.corpus_dir.join(format!("{stem}.html"));
    let txt_path = ctx.corpus_dir.join(format!("{stem}.txt"));

    if !page.was_cached {
        if ctx.config.crawler.save_html_content {
            tracing::debug!("SAVE page filename: {}", html_path.display());
            std::fs::write(&html_path, analysis.normalized.as_bytes())?;

            let (_title, text) = ctx.html_extractor.extract(&analysis.normalized);
            let text_file_size = if text.is_empty() {
                0
            } else {
                std::fs::write(&txt_path, text.as_bytes())?;
                std::fs::metadata(&txt_path)?.len()
            };

            if ctx.config.crawler.cache_enabled {
                let url_file_size = std::fs::metadata(&html_path)?.len();
                ctx.cache.upsert(&CacheEntry::new(
                    &page.cleaned_url,
                    "text/html",
                    html_path.to_string_lossy(),
                    url_file_size,
                    txt_path.to_string_lossy(),
                    text_file_size,
                    &analysis.hash,
                ))?;
            }
        } else {
            tracing::debug!("MARK page filename: {}", html_path.display());
        }
    } else if !txt_path.exists() {
        // The raw artifact survived but its text sibling is gone.
        tracing::warn!("Regenerating {}", txt_path.display());
        let (_title, text) = ctx.html_extractor.extract(&analysis.normalized);
        if !text.is_empty() {
            std::fs::write(&txt_path, text.as_bytes())?;
        }
    } else {
        tracing::debug!(
            "Skipped {} for corpus collection, already cached",
            page.cleaned_url
        );
    }

    if expand_links {
        tracing::debug!("Processing child links for {}", entry.url);
        for child_url in analysis.links {
            if should_visit(&child_url, &ctx.filter, &ctx.visited) {
                tracing::info!(
                    "ADD_TO_CRAWL:({}/{}) Parent: '{}' Child: '{}'",
                    entry.depth_actual,
                    depth_effective,
                    entry.url,
                    child_url
                );
                let child = entry.child(child_url, depth_effective);
                ctx.cache.enqueue_pending(&child)?;
                if !ctx.frontier.push(child).await {
                    // Frontier closed mid-shutdown; stop enqueueing.
                    break;
                }
            }
        }
    } else {
        tracing::debug!("Skipping child links for {}", entry.url);
    }

    Ok(())
}

/// The PDF pipeline
///
/// Writes the raw bytes, extracts text through the pluggable extractor,
/// and records the artifact pair. No link extraction. An extraction
/// failure keeps the `.pdf` but writes neither `.txt` nor a cache row, so
/// the URL is retried on a later run.
pub(crate) fn process_pdf(ctx: &CrawlContext, page: &PageContent) -> Result<()> {
    let stem = artifact_stem(&page.cleaned_url);
    let pdf_path = ctx.corpus_dir.join(format!("{stem}.pdf"));
    let txt_path = ctx.corpus_dir.join(format!("{stem}.txt"));

    if !page.was_cached {
        std::fs::write(&pdf_path, &page.bytes)?;
        tracing::debug!("PDF saved to {}", pdf_path.display());
    }

    let (title, text) = ctx.pdf_extractor.extract(&pdf_path)?;

    tracing::debug!("Save PDF-to-text: {}", txt_path.display());
    std::fs::write(&txt_path, format_text_artifact(title.as_deref(), &text))?;

    if ctx.config.crawler.cache_enabled {
        let url_file_size = std::fs::metadata(&pdf_path)?.len();
        let text_file_size = std::fs::metadata(&txt_path)?.len();
        ctx.cache.upsert(&CacheEntry::new(
            &page.cleaned_url,
            "application/pdf",
            pdf_path.to_string_lossy(),
            url_file_size,
            txt_path.to_string_lossy(),
            text_file_size,
            digest_hex(&page.bytes),
        ))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pdf() {
        assert_eq!(classify_content("application/pdf", true), ContentKind::Pdf);
        assert_eq!(
            classify_content("application/pdf", false),
            ContentKind::Unsupported
        );
    }

    #[test]
    fn test_classify_html() {
        assert_eq!(
            classify_content("text/html; charset=utf-8", true),
            ContentKind::Html
        );
    }

    #[test]
    fn test_classify_ignored_kinds() {
        assert_eq!(
            classify_content("application/xml", true),
            ContentKind::Ignored("XML")
        );
        assert_eq!(classify_content("text/css", true), ContentKind::Ignored("CSS"));
        assert_eq!(
            classify_content("text/javascript", true),
            ContentKind::Ignored("Javascript")
        );
        assert_eq!(
            classify_content("image/png", true),
            ContentKind::Ignored("PNG image")
        );
        assert_eq!(
            classify_content("application/vnd.ms-powerpoint", true),
            ContentKind::Ignored("PPT Powerpoint")
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(
            classify_content("application/octet-stream", true),
            ContentKind::Unsupported
        );
        assert_eq!(classify_content("", true), ContentKind::Unsupported);
    }

    #[test]
    fn test_content_hash_normalises_case_and_whitespace() {
        let a = content_hash(b"  <HTML>Body</HTML>\n");
        let b = content_hash(b"<html>body</html>");
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_hash_differs_for_different_bodies() {
        assert_ne!(content_hash(b"<html>a</html>"), content_hash(b"<html>b</html>"));
    }

    #[test]
    fn test_content_hash_of_whitespace_only() {
        // Must not panic; degenerate but possible.
        assert_eq!(content_hash(b"   \n  "), content_hash(b""));
    }

    #[test]
    fn test_strip_ad_scripts_removes_matching_src() {
        let html = r#"<html><body>
            <script src="https://substackcdn.example/bundle.js"></script>
            <script src="https://kept.test/app.js"></script>
            <p>Body</p>
            </body></html>"#;
        let analysis = analyze_html(html, None);
        assert!(!analysis.normalized.contains("substackcdn"));
        assert!(analysis.normalized.contains("kept.test/app.js"));
        assert!(analysis.normalized.contains("<p>Body</p>"));
    }

    #[test]
    fn test_inline_scripts_survive_adjustment() {
        let html = r#"<html><body><script>var inline = 1;</script></body></html>"#;
        let analysis = analyze_html(html, None);
        assert!(analysis.normalized.contains("var inline = 1;"));
    }

    #[test]
    fn test_analyze_collects_links_only_with_base() {
        let html = r#"<html><body><a href="/child">c</a></body></html>"#;
        let base = Url::parse("http://home.test/").unwrap();

        let with_base = analyze_html(html, Some(&base));
        assert_eq!(with_base.links, vec!["http://home.test/child"]);

        let without = analyze_html(html, None);
        assert!(without.links.is_empty());
    }

    #[test]
    fn test_identical_documents_share_a_hash() {
        let html = r#"<html><body><p>Same everywhere</p></body></html>"#;
        let a = analyze_html(html, None);
        let b = analyze_html(html, None);
        assert_eq!(a.hash, b.hash);
    }
}
