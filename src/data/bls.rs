//! BLS public API client
//!
//! Sends batched timeseries requests (a list of series over an inclusive year
//! range) to the BLS v2 API and returns the raw response body. Decoding is
//! left to [`super::decode`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::BlsRequest;
use crate::error::UpstreamError;

/// Base URL for the BLS timeseries endpoint
pub const BLS_API_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of raw upstream timeseries payloads
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetches every requested series for `start_year..=end_year`
    ///
    /// A non-2xx HTTP status is reported as an error; the body of a 2xx
    /// response is returned untouched, even if it reports a failed request.
    async fn fetch_year(
        &self,
        series_ids: &[String],
        start_year: &str,
        end_year: &str,
    ) -> Result<String, UpstreamError>;
}

#[async_trait]
impl<U: UpstreamClient + ?Sized> UpstreamClient for &U {
    async fn fetch_year(
        &self,
        series_ids: &[String],
        start_year: &str,
        end_year: &str,
    ) -> Result<String, UpstreamError> {
        (**self).fetch_year(series_ids, start_year, end_year).await
    }
}

/// Client for the BLS public API
#[derive(Debug, Clone)]
pub struct BlsClient {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for BlsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BlsClient {
    /// Create a new BlsClient with default settings
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
            base_url: BLS_API_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create a new BlsClient with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            http_client: client,
            base_url: BLS_API_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Point the client at a different endpoint (mirrors, proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Bound each request by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::TimedOut(self.timeout)
        } else {
            UpstreamError::RequestFailed(err)
        }
    }
}

#[async_trait]
impl UpstreamClient for BlsClient {
    async fn fetch_year(
        &self,
        series_ids: &[String],
        start_year: &str,
        end_year: &str,
    ) -> Result<String, UpstreamError> {
        let request = BlsRequest::new(series_ids, start_year, end_year);
        info!(
            url = %self.base_url,
            series = ?request.series_ids,
            start_year,
            end_year,
            "Sending request to BLS API"
        );

        let response = self
            .http_client
            .post(&self.base_url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        debug!(status = status.as_u16(), bytes = body.len(), "Received response from BLS API");

        Ok(body)
    }
}
