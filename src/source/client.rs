use anyhow::{Context, Result};
use http::header::ACCEPT;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{debug, warn};

use super::error::{status_message, TransportError};
use crate::config::Config;

/// HTTP client for the stats API
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    base: Url,
    retry_delay: Duration,
}

impl StatsClient {
    pub fn new(api_url: &str, timeout: Duration, retry_delay: Duration) -> Result<Self> {
        let base = Url::parse(api_url).with_context(|| format!("Invalid API URL '{}'", api_url))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("heatsheet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base,
            retry_delay,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    /// Base URL joined with `segments`, plus `query` when non-empty
    pub fn endpoint_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError {
                status: 0,
                message: format!("API URL '{}' cannot take a path", self.base),
                endpoint: segments.join("/"),
            })?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET and decode JSON, retrying a failed attempt exactly once
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        let url = self.endpoint_url(segments, query)?;
        let strategy = FixedInterval::new(self.retry_delay).take(1);

        Retry::spawn(strategy, || self.get_once::<T>(&url)).await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T, TransportError> {
        let endpoint = url.path().to_string();
        debug!(%url, "GET");

        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(%endpoint, error = %e, "request failed");
                if e.is_timeout() {
                    TransportError {
                        status: 0,
                        message: status_message(408),
                        endpoint: endpoint.clone(),
                    }
                } else {
                    TransportError::unreachable(endpoint.clone())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%endpoint, status = status.as_u16(), "API error");
            return Err(TransportError::from_status(status.as_u16(), endpoint));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(%endpoint, error = %e, "failed to read response body");
            TransportError::unreachable(endpoint.clone())
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            warn!(%endpoint, error = %e, "failed to decode response");
            TransportError::undecodable(endpoint)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> StatsClient {
        StatsClient::new(base, Duration::from_secs(5), Duration::from_millis(1)).unwrap()
    }

    #[test]
    fn test_endpoint_url_joins_segments() {
        let url = client("https://example.com/api/v1")
            .endpoint_url(&["events", "42", "stats"], &[("sex", "Women")])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/events/42/stats?sex=Women");
    }

    #[test]
    fn test_endpoint_url_trailing_slash_and_escaping() {
        let url = client("https://example.com/api/v1/")
            .endpoint_url(&["events", "1", "stats"], &[("round_name", "Round 2")])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/events/1/stats?round_name=Round+2");
    }

    #[test]
    fn test_endpoint_url_without_query() {
        let url = client("http://localhost:8000").endpoint_url(&["events"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/events");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(StatsClient::new("nope", Duration::from_secs(1), Duration::ZERO).is_err());
    }
}
