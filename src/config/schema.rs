use serde::{Deserialize, Serialize};

use crate::records::Division;

pub const DEFAULT_API_URL: &str = "https://windsurf-world-tour-stats-api.duckdns.org/api/v1";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub division: Division,
    /// Transport timeout per request, in seconds
    pub request_timeout_secs: u64,
    /// Delay before the single automatic retry of a failed fetch
    pub retry_delay_ms: u64,
    /// Send the active filter with athlete fetches so fleet baselines share its scope
    pub forward_filters: bool,
    /// TUI auto-refresh interval in seconds
    pub auto_refresh_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            division: Division::default(),
            request_timeout_secs: 30,
            retry_delay_ms: 500,
            forward_filters: true,
            auto_refresh_interval: 300,
        }
    }
}
