use scraper::{Html, Selector};

/// Strategy seam for HTML-to-text extraction
///
/// The crawl engine only needs `(title, text)` back; richer extractors
/// (boilerplate removal, article isolation) plug in here per deployment.
pub trait HtmlExtractor: Send + Sync {
    /// Extracts the page title and plain text from an HTML document
    fn extract(&self, html: &str) -> (Option<String>, String);
}

/// Default extractor: strips tags, scripts and styles, collapses whitespace
pub struct TagStripExtractor;

impl HtmlExtractor for TagStripExtractor {
    fn extract(&self, html: &str) -> (Option<String>, String) {
        let mut document = Html::parse_document(html);

        let title = extract_title(&document);

        // Drop script and style subtrees so their contents never reach the
        // text artifact.
        if let Ok(selector) = Selector::parse("script, style") {
            let doomed: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
            for id in doomed {
                if let Some(mut node) = document.tree.get_mut(id) {
                    node.detach();
                }
            }
        }

        let raw: String = document
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ");
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        (title, text)
    }
}

/// Extracts the page title from the `<title>` tag
pub fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
