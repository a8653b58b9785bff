use crate::config::types::{Config, ExtractConfig, OutputConfig, UserAgentConfig};
use crate::handler::parse_selector;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_user_agent_config(&config.user_agent)?;
    validate_seeds(&config.seeds)?;
    validate_extract_config(&config.extract)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens/underscores only
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.name
        )));
    }

    if config.version.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates seed URLs
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "At least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS scheme",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates selectors
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    parse_selector(&config.selector)?;

    if let Some(follow) = &config.follow {
        parse_selector(follow)?;
    }

    if matches!(&config.attribute, Some(attribute) if attribute.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "extract attribute cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.count() == 0 {
        return Err(ConfigError::Validation(
            "At least one output (console, file, or database) must be enabled".to_string(),
        ));
    }

    if matches!(&config.file, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "output file path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.database, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "output database path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
