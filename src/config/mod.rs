mod schema;
mod validation;

pub use schema::{Config, DEFAULT_API_URL};
pub use validation::validate_config;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const API_URL_ENV: &str = "HEATSHEET_API_URL";

/// Get the config directory path (~/.config/heatsheet/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("heatsheet"))
}

/// Get the default config file path (~/.config/heatsheet/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/heatsheet/config.yaml)
///
/// A missing file yields the defaults. An explicitly requested path must exist.
/// `HEATSHEET_API_URL` overrides `api_url` either way.
///
/// # Errors
///
/// Returns an error if:
/// - An explicit `path` does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    let mut config = if config_path.exists() {
        read_config_file(&config_path)?
    } else if explicit {
        anyhow::bail!("Config file not found at {}", config_path.display());
    } else {
        debug!(path = %config_path.display(), "no config file, using defaults");
        Config::default()
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
        apply_api_url_override(&mut config, &url);
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    // An empty file is a valid "all defaults" config
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", path.display()))
}

fn apply_api_url_override(config: &mut Config, url: &str) {
    let url = url.trim();
    if !url.is_empty() {
        debug!(%url, "api_url overridden from {}", API_URL_ENV);
        config.api_url = url.to_string();
    }
}
