use crate::crawler::VisitedSet;
use crate::url::SiteFilter;
use regex::RegexBuilder;
use std::sync::OnceLock;

/// Image extensions the crawler never downloads
fn image_ext_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"\.(jpe?g|gif|png)$")
            .case_insensitive(true)
            .build()
            .expect("image extension regex")
    })
}

/// Decides whether a URL may enter the frontier
///
/// A URL is declined when it matches the deny-list, points at an archive
/// service, was already dispatched this run, ends in an image extension,
/// carries a `mailto:`/`javascript:` scheme, or is a platform comment
/// permalink. Everything else is admitted.
pub fn should_visit(url: &str, filter: &SiteFilter, visited: &VisitedSet) -> bool {
    if filter.is_denied(url) {
        tracing::debug!("Visit declined, deny-list match: {url}");
        return false;
    }

    if filter.is_archive_url(url) {
        tracing::debug!("Visit declined, archive URL: {url}");
        return false;
    }

    if visited.contains(url) {
        tracing::debug!("Visit declined, previously visited: {url}");
        return false;
    }

    if image_ext_re().is_match(url) {
        tracing::debug!("Visit declined, image: {url}");
        return false;
    }

    if url.starts_with("mailto:") || url.starts_with("javascript:") {
        tracing::debug!("Visit declined, non-http scheme: {url}");
        return false;
    }

    if filter.is_comment_permalink(url) {
        tracing::debug!("Visit declined, comment permalink: {url}");
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SitesConfig;

    fn test_filter() -> SiteFilter {
        let sites = SitesConfig {
            seed_url: "http://home.test".to_string(),
            home_family: vec!["home.test".to_string()],
            deny_patterns: vec![r"blocked\.test".to_string()],
        };
        SiteFilter::compile(&sites).unwrap()
    }

    #[test]
    fn test_admits_ordinary_url() {
        let visited = VisitedSet::new();
        assert!(should_visit("http://home.test/page", &test_filter(), &visited));
        assert!(should_visit(
            "http://elsewhere.test/page",
            &test_filter(),
            &visited
        ));
    }

    #[test]
    fn test_declines_denied() {
        let visited = VisitedSet::new();
        assert!(!should_visit(
            "http://blocked.test/page",
            &test_filter(),
            &visited
        ));
    }

    #[test]
    fn test_declines_archive() {
        let visited = VisitedSet::new();
        assert!(!should_visit(
            "http://web.archive.org/web/2019/http://home.test",
            &test_filter(),
            &visited
        ));
    }

    #[test]
    fn test_declines_visited() {
        let visited = VisitedSet::new();
        visited.insert("http://home.test/page");
        assert!(!should_visit("http://home.test/page", &test_filter(), &visited));
    }

    #[test]
    fn test_declines_images() {
        let visited = VisitedSet::new();
        for url in [
            "http://home.test/photo.jpg",
            "http://home.test/photo.JPEG",
            "http://home.test/anim.gif",
            "http://home.test/logo.png",
        ] {
            assert!(!should_visit(url, &test_filter(), &visited), "{url}");
        }
    }

    #[test]
    fn test_declines_special_schemes() {
        let visited = VisitedSet::new();
        assert!(!should_visit("mailto:a@home.test", &test_filter(), &visited));
        assert!(!should_visit("javascript:void(0)", &test_filter(), &visited));
    }

    #[test]
    fn test_declines_comment_permalink() {
        let visited = VisitedSet::new();
        assert!(!should_visit(
            "https://writer.substack.com/p/post?commentId=9",
            &test_filter(),
            &visited
        ));
    }
}
