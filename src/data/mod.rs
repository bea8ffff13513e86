//! Core data models for CPI Search
//!
//! This module contains the types exchanged with the BLS public API and the
//! flattened record shape that is stored in the cache.

pub mod bls;
pub mod decode;

pub use bls::{BlsClient, UpstreamClient};
pub use decode::{decode, DecodeError};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Free-form annotation attached to an upstream observation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    /// Footnote code (e.g., "P" for preliminary)
    pub code: Option<String>,
    /// Human-readable footnote text
    pub text: Option<String>,
}

impl Footnote {
    /// Returns true if neither code nor text is present
    ///
    /// The BLS API emits `{}` in the footnote list of observations that carry
    /// no annotation.
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.text.is_none()
    }
}

/// One upstream observation for a series at a specific year/period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPoint {
    /// Calendar year (e.g., "2023")
    pub year: String,
    /// Period code (e.g., "M03")
    pub period: String,
    /// Period name (e.g., "March")
    pub period_name: String,
    /// Whether this is the most recent observation of the series
    pub latest: Option<bool>,
    /// Observed value, kept as the upstream string
    pub value: String,
    /// Annotations in upstream order
    pub footnotes: Vec<Footnote>,
}

/// A named upstream time series with its observations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Upstream series identifier
    pub series_id: String,
    /// Observations in upstream order
    pub data_points: Vec<DataPoint>,
}

/// Decoded BLS API response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlsResponse {
    /// Upstream status string (e.g., "REQUEST_SUCCEEDED")
    pub status: String,
    /// Upstream processing time in milliseconds
    pub response_time_ms: i64,
    /// Informational or error messages from upstream
    pub messages: Vec<String>,
    /// Series data; `None` when upstream returned no `Results` node
    pub series: Option<Vec<Series>>,
}

impl BlsResponse {
    /// Status string BLS uses for a fully processed request
    pub const STATUS_SUCCEEDED: &'static str = "REQUEST_SUCCEEDED";

    /// Returns true if upstream reported full success
    pub fn is_success(&self) -> bool {
        self.status == Self::STATUS_SUCCEEDED
    }
}

/// Flattened, cache-ready CPI value for one series in one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpiRecord {
    /// Upstream series identifier
    pub series_id: String,
    /// Calendar year
    pub year: String,
    /// Month name as reported by upstream (e.g., "March")
    pub month: String,
    /// CPI value as reported by upstream
    pub cpi_value: String,
    /// Rendered footnotes, empty when the observation has none
    #[serde(default)]
    pub notes: Vec<String>,
}

/// A single lookup of (year, month) across a set of series
///
/// Series IDs are deduplicated so that "all requested series resolved" can be
/// checked by comparing counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub series_ids: BTreeSet<String>,
    pub year: String,
    pub month: String,
}

impl SeriesRequest {
    /// Creates a request, collapsing duplicate series IDs
    pub fn new<I, S>(year: impl Into<String>, month: impl Into<String>, series_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            series_ids: series_ids.into_iter().map(Into::into).collect(),
            year: year.into(),
            month: month.into(),
        }
    }

    /// Series IDs as an ordered list, the shape the upstream request expects
    pub fn series_list(&self) -> Vec<String> {
        self.series_ids.iter().cloned().collect()
    }
}

/// Request body for the BLS timeseries endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlsRequest {
    #[serde(rename = "seriesid")]
    pub series_ids: Vec<String>,
    #[serde(rename = "startyear")]
    pub start_year: String,
    #[serde(rename = "endyear")]
    pub end_year: String,
    pub catalog: bool,
    pub calculations: bool,
    #[serde(rename = "annualaverage")]
    pub annual_average: bool,
    pub aspects: bool,
}

impl BlsRequest {
    /// Creates a request for the given series over an inclusive year range
    pub fn new(series_ids: &[String], start_year: &str, end_year: &str) -> Self {
        Self {
            series_ids: series_ids.to_vec(),
            start_year: start_year.to_string(),
            end_year: end_year.to_string(),
            ..Default::default()
        }
    }
}
