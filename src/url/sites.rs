use crate::config::SitesConfig;
use crate::ConfigError;
use regex::{Regex, RegexBuilder};
use url::Url;

/// Compiled allow-list and deny-list, built once at startup
///
/// The allow-list anchors on the scheme and an optional `www.` prefix and
/// requires the domain to end at a path boundary, so `home.test` does not
/// match `home.test.evil`. The deny-list is a free search over the whole
/// URL. Deny wins over allow.
#[derive(Debug)]
pub struct SiteFilter {
    home_family: Regex,
    deny: Option<Regex>,
    archive: Regex,
}

impl SiteFilter {
    /// Compiles the filter from the sites configuration
    pub fn compile(sites: &SitesConfig) -> Result<Self, ConfigError> {
        let domains = sites
            .home_family
            .iter()
            .map(|d| regex::escape(d))
            .collect::<Vec<_>>()
            .join("|");

        let home_family = RegexBuilder::new(&format!(r"^https?://(www\.)?({domains})(/|$)"))
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern(format!("home-family: {e}")))?;

        let deny = if sites.deny_patterns.is_empty() {
            None
        } else {
            let joined = sites.deny_patterns.join("|");
            Some(
                RegexBuilder::new(&joined)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConfigError::InvalidPattern(format!("deny-patterns: {e}")))?,
            )
        };

        let archive = RegexBuilder::new(r"^https?://web\.archive\.org")
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern(format!("archive: {e}")))?;

        Ok(Self {
            home_family,
            deny,
            archive,
        })
    }

    /// Returns true when the URL belongs to the home-family allow-list
    ///
    /// Effective depth resets to zero for such URLs and their child links
    /// are eligible for enumeration.
    pub fn is_home_family(&self, url: &str) -> bool {
        self.home_family.is_match(url)
    }

    /// Returns true when any deny pattern matches the URL
    pub fn is_denied(&self, url: &str) -> bool {
        self.deny.as_ref().is_some_and(|re| re.is_match(url))
    }

    /// Returns true for archive-service URLs, which are never enqueued
    pub fn is_archive_url(&self, url: &str) -> bool {
        self.archive.is_match(url)
    }

    /// Detects platform comment permalinks
    ///
    /// Substack renders every comment as its own page; a query key
    /// containing `comment` on a substack host marks one of those.
    pub fn is_comment_permalink(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        if !host.ends_with("substack.com") {
            return false;
        }
        parsed
            .query_pairs()
            .any(|(key, _)| key.to_lowercase().contains("comment"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_filter() -> SiteFilter {
        let sites = SitesConfig {
            seed_url: "http://www.home.test".to_string(),
            home_family: vec!["home.test".to_string(), "second-home.org".to_string()],
            deny_patterns: vec![
                r"^javascript:".to_string(),
                r"^mailto:".to_string(),
                r"blocked\.test".to_string(),
                r"\.gov\b".to_string(),
            ],
        };
        SiteFilter::compile(&sites).unwrap()
    }

    #[test]
    fn test_home_family_match() {
        let filter = test_filter();
        assert!(filter.is_home_family("http://home.test"));
        assert!(filter.is_home_family("https://home.test/page"));
        assert!(filter.is_home_family("http://www.home.test/page"));
        assert!(filter.is_home_family("HTTP://WWW.HOME.TEST/page"));
        assert!(filter.is_home_family("https://second-home.org/deep/path"));
    }

    #[test]
    fn test_home_family_requires_boundary() {
        let filter = test_filter();
        assert!(!filter.is_home_family("http://home.test.evil/page"));
        assert!(!filter.is_home_family("http://nothome.test/page"));
        assert!(!filter.is_home_family("http://sub.home.test/page"));
    }

    #[test]
    fn test_deny_patterns() {
        let filter = test_filter();
        assert!(filter.is_denied("javascript:void(0)"));
        assert!(filter.is_denied("mailto:a@b.test"));
        assert!(filter.is_denied("http://blocked.test/whatever"));
        assert!(filter.is_denied("http://agency.gov/page"));
        assert!(!filter.is_denied("http://home.test/page"));
    }

    #[test]
    fn test_deny_is_case_insensitive() {
        let filter = test_filter();
        assert!(filter.is_denied("http://BLOCKED.TEST/x"));
    }

    #[test]
    fn test_deny_wins_over_home_family() {
        let sites = SitesConfig {
            seed_url: "http://home.test".to_string(),
            home_family: vec!["home.test".to_string()],
            deny_patterns: vec![r"home\.test/private".to_string()],
        };
        let filter = SiteFilter::compile(&sites).unwrap();
        let url = "http://home.test/private/page";
        // Both match; callers consult is_denied first.
        assert!(filter.is_home_family(url));
        assert!(filter.is_denied(url));
    }

    #[test]
    fn test_archive_urls() {
        let filter = test_filter();
        assert!(filter.is_archive_url("http://web.archive.org/web/2020/http://home.test"));
        assert!(filter.is_archive_url("https://web.archive.org/web/2020/x"));
        assert!(!filter.is_archive_url("http://home.test/web.archive.org"));
    }

    #[test]
    fn test_comment_permalink() {
        let filter = test_filter();
        assert!(filter.is_comment_permalink("https://writer.substack.com/p/post?commentId=42"));
        assert!(filter.is_comment_permalink("https://writer.substack.com/p/post?open_comment=1"));
        assert!(!filter.is_comment_permalink("https://writer.substack.com/p/post?page=2"));
        assert!(!filter.is_comment_permalink("https://home.test/p/post?commentId=42"));
    }

    #[test]
    fn test_empty_deny_list_denies_nothing() {
        let sites = SitesConfig {
            seed_url: "http://home.test".to_string(),
            home_family: vec!["home.test".to_string()],
            deny_patterns: vec![],
        };
        let filter = SiteFilter::compile(&sites).unwrap();
        assert!(!filter.is_denied("http://anything.test/at/all"));
    }
}
