use crate::config::types::Config;
use crate::ConfigError;

/// Validates a configuration beyond what the type system enforces
///
/// Checks value ranges and compiles every site pattern once so a bad
/// regex fails at startup rather than mid-crawl.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.num_workers == 0 {
        return Err(ConfigError::Validation(
            "crawler.num-workers must be at least 1".to_string(),
        ));
    }

    if config.crawler.frontier_capacity == 0 {
        return Err(ConfigError::Validation(
            "crawler.frontier-capacity must be at least 1".to_string(),
        ));
    }

    if config.crawler.progress_report_pages == 0 {
        return Err(ConfigError::Validation(
            "crawler.progress-report-pages cannot be zero".to_string(),
        ));
    }

    if config.fetch.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch.request-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.sites.home_family.is_empty() {
        return Err(ConfigError::Validation(
            "sites.home-family must list at least one domain".to_string(),
        ));
    }

    if config.sites.seed_url.is_empty() {
        return Err(ConfigError::Validation(
            "sites.seed-url cannot be empty".to_string(),
        ));
    }

    for pattern in &config.sites.deny_patterns {
        regex::Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("{pattern}: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.crawler.num_workers = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_progress_cadence_rejected() {
        let mut config = Config::default();
        config.crawler.progress_report_pages = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_home_family_rejected() {
        let mut config = Config::default();
        config.sites.home_family.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_deny_pattern_rejected() {
        let mut config = Config::default();
        config.sites.deny_patterns.push("([unclosed".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
