//! Error types surfaced by the retrieval layer

use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheError;
use crate::data::DecodeError;

/// The upstream fetch-and-cache step could not complete
///
/// Callers should treat this as "try again later": the data may well exist
/// but could not be obtained right now.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed at the transport level
    #[error("HTTP request to BLS API failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// BLS API answered with a non-success HTTP status
    #[error("BLS API returned HTTP status {0}")]
    HttpStatus(u16),

    /// The call did not finish before its deadline
    #[error("BLS API call timed out after {0:?}")]
    TimedOut(Duration),

    /// Payload could not be decoded
    #[error("{0}")]
    Decode(#[from] DecodeError),

    /// A decoded record could not be written to the cache
    #[error("Failed to cache BLS data: {0}")]
    CacheWrite(#[from] CacheError),
}

/// Errors returned by [`crate::retrieval::CpiRetriever::retrieve`]
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Upstream problem; the lookup may succeed later
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Upstream succeeded but has no value for these series in the requested month
    #[error("No CPI data for {month} {year} for series: {}", missing.join(", "))]
    IncompleteData {
        year: String,
        month: String,
        missing: Vec<String>,
    },
}
