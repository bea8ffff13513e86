//! BLS API response decoding
//!
//! Parses the raw JSON payload returned by the timeseries endpoint into a
//! [`BlsResponse`]. Only `status` and `responseTime` are required; the
//! `Results` node is absent on failed or empty requests and decodes to
//! `series: None`. Unknown fields are ignored.

use serde::Deserialize;
use thiserror::Error;

use super::{BlsResponse, DataPoint, Footnote, Series};

/// Errors that can occur when decoding an upstream payload
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON or is missing a required field
    #[error("Failed to parse BLS response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Decodes a raw BLS API payload
pub fn decode(raw: &str) -> Result<BlsResponse, DecodeError> {
    let wire: WireResponse = serde_json::from_str(raw)?;
    Ok(wire.into())
}

/// Top-level BLS API response structure
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    status: String,
    response_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    message: Vec<String>,
    #[serde(rename = "Results", default)]
    results: Option<WireResults>,
}

#[derive(Debug, Deserialize)]
struct WireResults {
    #[serde(default, deserialize_with = "null_as_default")]
    series: Vec<WireSeries>,
}

#[derive(Debug, Deserialize)]
struct WireSeries {
    #[serde(rename = "seriesID")]
    series_id: String,
    #[serde(default)]
    data: Option<Vec<WireDataPoint>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDataPoint {
    year: String,
    period: String,
    period_name: String,
    #[serde(default, deserialize_with = "deserialize_latest")]
    latest: Option<bool>,
    value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    footnotes: Vec<Option<Footnote>>,
}

impl From<WireResponse> for BlsResponse {
    fn from(wire: WireResponse) -> Self {
        Self {
            status: wire.status,
            response_time_ms: wire.response_time,
            messages: wire.message,
            series: wire
                .results
                .map(|results| results.series.into_iter().map(Series::from).collect()),
        }
    }
}

impl From<WireSeries> for Series {
    fn from(wire: WireSeries) -> Self {
        Self {
            series_id: wire.series_id,
            data_points: wire
                .data
                .unwrap_or_default()
                .into_iter()
                .map(DataPoint::from)
                .collect(),
        }
    }
}

impl From<WireDataPoint> for DataPoint {
    fn from(wire: WireDataPoint) -> Self {
        Self {
            year: wire.year,
            period: wire.period,
            period_name: wire.period_name,
            latest: wire.latest,
            value: wire.value,
            footnotes: wire
                .footnotes
                .into_iter()
                .flatten()
                .filter(|footnote| !footnote.is_empty())
                .collect(),
        }
    }
}

/// Treats an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// BLS sends `latest` as the string "true"; accept a real boolean as well
fn deserialize_latest<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Latest {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Latest>::deserialize(deserializer)? {
        Some(Latest::Bool(flag)) => Some(flag),
        Some(Latest::Text(text)) => Some(text.eq_ignore_ascii_case("true")),
        None => None,
    })
}
