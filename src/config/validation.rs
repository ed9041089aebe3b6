use crate::config::types::{
    Config, ControlConfig, CrawlerConfig, FetchConfig, OutputConfig, ProxyConfig, RateLimitConfig,
};
use crate::url::CrawlTarget;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_proxy_config(&config.proxy)?;
    if let Some(control) = &config.control {
        validate_control_config(control)?;
    }
    validate_fetch_config(&config.fetch)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "proxy host cannot be empty".to_string(),
        ));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation("proxy port cannot be 0".to_string()));
    }

    if config.poll_interval == 0 {
        return Err(ConfigError::Validation(
            "poll-interval must be >= 1s".to_string(),
        ));
    }

    if config.wait_timeout < config.poll_interval {
        return Err(ConfigError::Validation(format!(
            "wait-timeout ({}s) must be at least poll-interval ({}s)",
            config.wait_timeout, config.poll_interval
        )));
    }

    Ok(())
}

/// Validates Tor control configuration
fn validate_control_config(config: &ControlConfig) -> Result<(), ConfigError> {
    if config.port == 0 {
        return Err(ConfigError::Validation(
            "control port cannot be 0".to_string(),
        ));
    }

    if let Some(password) = &config.password {
        if password.contains(&['\r', '\n', '"'][..]) {
            return Err(ConfigError::Validation(
                "control password cannot contain quotes or line breaks".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1s".to_string(),
        ));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.max_content_bytes == 0 {
        return Err(ConfigError::Validation(
            "max-content-bytes must be > 0".to_string(),
        ));
    }

    if !config.backoff_base.is_finite() || config.backoff_base < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-base must be a non-negative number, got {}",
            config.backoff_base
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if let Some(hosts) = &config.allow_list {
        if hosts.is_empty() {
            return Err(ConfigError::Validation(
                "allow-list must name at least one host".to_string(),
            ));
        }
        if hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "allow-list entries cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates rate limit configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if !config.base.is_finite() || config.base < 0.0 {
        return Err(ConfigError::Validation(format!(
            "rate-limit base must be a non-negative number, got {}",
            config.base
        )));
    }

    if !config.jitter.is_finite() || config.jitter < 0.0 {
        return Err(ConfigError::Validation(format!(
            "rate-limit jitter must be a non-negative number, got {}",
            config.jitter
        )));
    }

    Ok(())
}

/// Validates crawler configuration and seeds
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages_per_domain < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages-per-domain must be >= 1, got {}",
            config.max_pages_per_domain
        )));
    }

    if config.snippet_tags.is_empty() {
        return Err(ConfigError::Validation(
            "snippet-tags must name at least one element".to_string(),
        ));
    }

    if !config
        .snippet_tags
        .iter()
        .all(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
    {
        return Err(ConfigError::Validation(format!(
            "snippet-tags must be plain element names, got {:?}",
            config.snippet_tags
        )));
    }

    if config.snippet_max_chars == 0 {
        return Err(ConfigError::Validation(
            "snippet-max-chars must be > 0".to_string(),
        ));
    }

    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        CrawlTarget::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
