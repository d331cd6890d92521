//! Bus arrival API HTTP client.
//!
//! Queries the national public-transit arrival service for the predicted
//! arrivals at one stop. Concurrency is capped with a semaphore so a cycle
//! over many routes does not burst the service's quota.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::domain::LiveArrival;

use super::TransitFeed;
use super::convert::parse_arrivals;
use super::error::FeedError;

/// Default base URL for the arrival information service.
const DEFAULT_BASE_URL: &str = "http://apis.data.go.kr/1613000/ArvlInfoInqireService";

/// Operation returning predicted arrivals for a stop.
const ARRIVALS_OPERATION: &str = "getSttnAcctoArvlPrearngeInfoList";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Service key issued by the open data portal
    pub service_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of rows requested per stop
    pub num_rows: u16,
}

impl FeedConfig {
    /// Create a new config with the given service key.
    pub fn new(service_key: impl Into<String>) -> Self {
        Self {
            service_key: service_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
            num_rows: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Arrival API client.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    num_rows: u16,
    semaphore: Arc<Semaphore>,
}

impl FeedClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key,
            num_rows: config.num_rows,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Get predicted arrivals at a stop.
    pub async fn get_arrivals(
        &self,
        stop_id: &str,
        city_code: u32,
    ) -> Result<Vec<LiveArrival>, FeedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FeedError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}/{}", self.base_url, ARRIVALS_OPERATION);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("serviceKey", self.service_key.clone()),
                ("pageNo", "1".to_string()),
                ("numOfRows", self.num_rows.to_string()),
                ("_type", "json".to_string()),
                ("cityCode", city_code.to_string()),
                ("nodeId", stop_id.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(FeedError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let body = response.text().await?;
        let arrivals = parse_arrivals(&body)?;

        tracing::debug!(stop = stop_id, count = arrivals.len(), "Fetched arrivals");
        Ok(arrivals)
    }
}

impl TransitFeed for FeedClient {
    async fn fetch_arrivals(
        &self,
        stop_id: &str,
        city_code: u32,
    ) -> Result<Vec<LiveArrival>, FeedError> {
        self.get_arrivals(stop_id, city_code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = FeedConfig::new("test-key")
            .with_base_url("http://localhost:8080")
            .with_max_concurrent(10)
            .with_timeout(3);

        assert_eq!(config.service_key, "test-key");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn config_defaults() {
        let config = FeedConfig::new("test-key");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.num_rows, 10);
    }

    #[test]
    fn client_creation() {
        let client = FeedClient::new(FeedConfig::new("test-key").with_base_url("http://x/"));
        let client = client.unwrap();
        assert_eq!(client.base_url, "http://x");
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let client = FeedClient::new(
            FeedConfig::new("k")
                .with_base_url("http://127.0.0.1:9")
                .with_timeout(2),
        )
        .unwrap();

        let result = client.get_arrivals("SJB293064313", 12).await;
        assert!(matches!(result, Err(FeedError::Http(_))));
    }
}
