//! Child-link enumeration
//!
//! Anchor hrefs are resolved against the page URL, special schemes and
//! fragment-only anchors are skipped, and trailing `#anchor` fragments are
//! stripped so anchor variants collapse to one frontier entry.

use crate::url::strip_fragment;
use scraper::{Html, Selector};
use url::Url;

/// Extracts candidate child links from a parsed document
///
/// Returns absolute `http`/`https` URLs with fragments stripped. The
/// admission gate (`should_visit`) runs later; this stage only resolves
/// and normalises.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, base_url) {
                    links.push(strip_fragment(&absolute));
                }
            }
        }
    }

    links
}

/// Resolves an href to an absolute URL, or None if it should be skipped
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    // mailto:/javascript: also fail the admission gate later; skipping the
    // whole scheme family here keeps junk out of the logs.
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Same-page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://home.test/page").unwrap()
    }

    fn links_from(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        extract_links(&document, &base_url())
    }

    #[test]
    fn test_absolute_link() {
        let links = links_from(r#"<a href="https://other.test/x">x</a>"#);
        assert_eq!(links, vec!["https://other.test/x"]);
    }

    #[test]
    fn test_relative_links() {
        let links = links_from(r#"<a href="/a">a</a><a href="b">b</a>"#);
        assert_eq!(links, vec!["https://home.test/a", "https://home.test/b"]);
    }

    #[test]
    fn test_fragment_is_stripped() {
        let links = links_from(r##"<a href="/a#section-1">a</a>"##);
        assert_eq!(links, vec!["https://home.test/a"]);
    }

    #[test]
    fn test_fragment_only_anchor_skipped() {
        assert!(links_from(r##"<a href="#top">top</a>"##).is_empty());
    }

    #[test]
    fn test_special_schemes_skipped() {
        let html = r#"
            <a href="javascript:void(0)">j</a>
            <a href="mailto:a@home.test">m</a>
            <a href="tel:+15551234">t</a>
            <a href="data:text/html,x">d</a>
        "#;
        assert!(links_from(html).is_empty());
    }

    #[test]
    fn test_non_http_scheme_skipped() {
        assert!(links_from(r#"<a href="ftp://files.test/x">f</a>"#).is_empty());
    }

    #[test]
    fn test_mixed_valid_and_invalid() {
        let html = r#"
            <a href="/keep">keep</a>
            <a href="javascript:no()">drop</a>
            <a href="/also-keep#frag">keep</a>
        "#;
        let links = links_from(html);
        assert_eq!(
            links,
            vec!["https://home.test/keep", "https://home.test/also-keep"]
        );
    }
}
