use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

/// Returns the compiled-in default configuration, validated
///
/// Used when no `--config` flag is given. Validation cannot fail for the
/// shipped defaults, but the check keeps the two entry points symmetrical.
pub fn default_config() -> Result<Config, ConfigError> {
    let config = Config::default();
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchStrategy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-depth = 3
max-pages = 500
num-workers = 4

[fetch]
strategy = "rendered"
user-agent = "TestBot/0.1"

[sites]
seed-url = "http://www.home.test"
home-family = ["home.test", "also-home.test"]
deny-patterns = ['badsite\.test']

[output]
corpus-dir = "./test_corpus/"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.max_pages, 500);
        assert_eq!(config.crawler.num_workers, 4);
        assert_eq!(config.fetch.strategy, FetchStrategy::Rendered);
        assert_eq!(config.fetch.user_agent, "TestBot/0.1");
        assert_eq!(config.sites.home_family.len(), 2);
        assert_eq!(config.output.corpus_dir, "./test_corpus/");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let file = create_temp_config("[crawler]\nmax-depth = 1\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 1);
        assert_eq!(config.crawler.num_workers, 8);
        assert_eq!(config.fetch.user_agent, "AiBot/1.0");
        assert_eq!(config.fetch.request_timeout_secs, 15);
        assert!(!config.sites.home_family.is_empty());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = default_config().unwrap();
        assert_eq!(config.crawler.max_pages, 0);
        assert!(config.crawler.load_pending_queue_on_start);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[crawler]\nnum-workers = 0\n");
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }
}
