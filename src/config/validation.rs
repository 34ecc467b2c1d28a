use crate::config::types::{
    Config, CrawlerConfig, Engine, IdentityConfig, OutputConfig, SelectorConfig, SiteConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_identity_config(&config.identity)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates crawl policy parameters
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.subject_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "subject_limit must be >= 1, got {}",
            config.subject_limit
        )));
    }

    if config.book_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "book_limit must be >= 1, got {}",
            config.book_limit
        )));
    }

    if config.worker_pool_size < 1 || config.worker_pool_size > 16 {
        return Err(ConfigError::Validation(format!(
            "worker_pool_size must be between 1 and 16, got {}",
            config.worker_pool_size
        )));
    }

    if config.metadata_concurrency < 1 || config.metadata_concurrency > 16 {
        return Err(ConfigError::Validation(format!(
            "metadata_concurrency must be between 1 and 16, got {}",
            config.metadata_concurrency
        )));
    }

    if config.jitter.is_empty() {
        return Err(ConfigError::Validation(
            "jitter must list at least one delay".to_string(),
        ));
    }

    if config.field_timeout == 0 {
        return Err(ConfigError::Validation(
            "field_timeout must be > 0ms".to_string(),
        ));
    }

    Ok(())
}

/// Validates the crawler identity
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    if config.purpose.trim().is_empty() {
        return Err(ConfigError::Validation(
            "purpose cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site origin and seed path
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if !config.subjects_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "subjects_path must start with '/', got '{}'",
            config.subjects_path
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("blocked_subjects_path", &config.blocked_subjects_path),
        ("open_subjects_path", &config.open_subjects_path),
        ("book_links_path", &config.book_links_path),
        ("records_path", &config.records_path),
    ] {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.open_subjects_path == config.book_links_path
        || config.open_subjects_path == config.blocked_subjects_path
        || config.book_links_path == config.blocked_subjects_path
    {
        return Err(ConfigError::Validation(
            "blocked, open-subject and book-link state files must be distinct".to_string(),
        ));
    }

    Ok(())
}

/// Checks that every configured selector is valid CSS
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (field, selector) in config.css_fields() {
        if Selector::parse(selector).is_err() {
            return Err(ConfigError::InvalidSelector {
                field: field.to_string(),
                selector: selector.to_string(),
            });
        }
    }

    if config.next_disabled_attribute.trim().is_empty() {
        return Err(ConfigError::Validation(
            "next_disabled_attribute cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Settings that load fine but do not behave as configured on the selected engine
pub fn engine_warnings(config: &Config) -> Vec<String> {
    crawler_engine_warnings(&config.crawler, &config.selectors)
}

fn crawler_engine_warnings(crawler: &CrawlerConfig, selectors: &SelectorConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if crawler.engine != Engine::Static {
        return warnings;
    }

    if !crawler.headless {
        warnings.push("headless = false has no effect with the static engine".to_string());
    }

    if selectors.next_button.trim_start().starts_with("button") {
        warnings.push(format!(
            "next-button \"{}\" selects a button; the static engine can only follow controls \
             with an href, so pagination stops after the first page",
            selectors.next_button
        ));
    }

    warnings
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
