//! Cache key derivation and response flattening
//!
//! Upstream groups a whole year of observations under each series. The cache
//! instead holds one [`CpiRecord`] per (year, month, series), so a decoded
//! response is flattened into individual records before it is written.

use tracing::warn;

use crate::data::{BlsResponse, CpiRecord, DataPoint, Footnote, Series};

/// Separator between the parts of a cache key
pub const KEY_DELIMITER: char = '-';

/// Derives the cache key `"<year>-<month>-<series_id>"`
///
/// Distinct triples give distinct keys as long as `year` and `month` contain
/// no `-`. Series IDs may contain `-` (e.g., "OEUN000000056--5747213213")
/// since they are always the last component.
pub fn derive_key(year: &str, month: &str, series_id: &str) -> String {
    format!("{year}{KEY_DELIMITER}{month}{KEY_DELIMITER}{series_id}")
}

/// Renders a footnote as `"Code: <code>, Text: <text>"`
pub fn render_footnote(footnote: &Footnote) -> String {
    format!(
        "Code: {}, Text: {}",
        footnote.code.as_deref().unwrap_or(""),
        footnote.text.as_deref().unwrap_or("")
    )
}

/// Builds the cache record for one observation of `series_id`
pub fn to_record(series_id: &str, point: &DataPoint) -> CpiRecord {
    CpiRecord {
        series_id: series_id.to_string(),
        year: point.year.clone(),
        month: point.period_name.clone(),
        cpi_value: point.value.clone(),
        notes: point.footnotes.iter().map(render_footnote).collect(),
    }
}

/// Flattens a series into one record per observation, in upstream order
pub fn flatten(series: &Series) -> Vec<CpiRecord> {
    if series.data_points.is_empty() {
        warn!(series_id = %series.series_id, "No data found for series");
        return Vec::new();
    }

    series
        .data_points
        .iter()
        .map(|point| to_record(&series.series_id, point))
        .collect()
}

/// Flattens every series of a response, in response order
pub fn flatten_response(response: &BlsResponse) -> Vec<CpiRecord> {
    response
        .series
        .iter()
        .flatten()
        .flat_map(flatten)
        .collect()
}

impl CpiRecord {
    /// Cache key this record is stored under
    pub fn cache_key(&self) -> String {
        derive_key(&self.year, &self.month, &self.series_id)
    }
}
