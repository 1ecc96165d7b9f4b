use reqwest::Url;

use super::schema::Config;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    match Url::parse(&config.api_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "api_url: unsupported scheme '{}' (expected http or https)",
            url.scheme()
        )),
        Err(e) => errors.push(format!("api_url: invalid URL '{}' - {}", config.api_url, e)),
    }

    if config.request_timeout_secs == 0 {
        errors.push("request_timeout_secs: must be greater than 0".to_string());
    }

    if config.auto_refresh_interval < 10 {
        errors.push(format!(
            "auto_refresh_interval: must be at least 10 seconds (got {})",
            config.auto_refresh_interval
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let config = Config {
            api_url: "ftp://example.com".to_string(),
            request_timeout_secs: 0,
            auto_refresh_interval: 5,
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("api_url: unsupported scheme"));
        assert!(errors[1].starts_with("request_timeout_secs"));
        assert!(errors[2].contains("got 5"));
    }

    #[test]
    fn test_unparseable_url() {
        let config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].starts_with("api_url: invalid URL 'not a url'"));
    }
}
