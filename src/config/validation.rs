use crate::config::types::{Config, CrawlConfig, ExtractionConfig, NavigationConfig};
use crate::ConfigError;
use url::Url;

/// Shortest filename cap that still leaves room for a stem and ".pdf"
const MIN_FILENAME_LEN: usize = 8;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_navigation_config(&config.navigation)?;
    validate_extraction_config(&config.extraction)?;
    Ok(())
}

/// Validates crawl limits
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_roots < 1 {
        return Err(ConfigError::Validation(format!(
            "max_roots must be >= 1, got {}",
            config.max_roots
        )));
    }

    Ok(())
}

/// Validates navigation retry settings
fn validate_navigation_config(config: &NavigationConfig) -> Result<(), ConfigError> {
    if config.discovery_attempts < 1 || config.root_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "navigation attempts must be >= 1, got discovery={} root={}",
            config.discovery_attempts, config.root_attempts
        )));
    }

    if config.discovery_timeout_secs == 0 || config.root_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation timeouts must be at least one second".to_string(),
        ));
    }

    if config.transient_signatures.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "transient_signatures cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates extraction settings
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.download_labels.is_empty() && config.aria_labels.is_empty() {
        return Err(ConfigError::Validation(
            "at least one download label or aria label is required".to_string(),
        ));
    }

    if config
        .download_labels
        .iter()
        .chain(&config.aria_labels)
        .chain(&config.expand_labels)
        .any(|label| label.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "label lists cannot contain empty entries".to_string(),
        ));
    }

    if config.resource_media_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "resource_media_token cannot be empty".to_string(),
        ));
    }

    if config.max_filename_len < MIN_FILENAME_LEN {
        return Err(ConfigError::Validation(format!(
            "max_filename_len must be >= {}, got {}",
            MIN_FILENAME_LEN, config.max_filename_len
        )));
    }

    if config.fallback_filename.trim().is_empty() || config.fallback_resource_name.trim().is_empty()
    {
        return Err(ConfigError::Validation(
            "fallback filenames cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed and root URLs supplied on the command line or in a roots file
///
/// Only absolute `http`/`https` URLs are accepted.
pub fn validate_start_urls(urls: &[String]) -> Result<(), ConfigError> {
    for raw in urls {
        let url = Url::parse(raw)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid URL '{}': {}", raw, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "URL '{}' must use http or https",
                raw
            )));
        }
    }

    Ok(())
}
