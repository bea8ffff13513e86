//! Cache-first CPI retrieval
//!
//! [`CpiRetriever`] answers "what was the CPI value for series S in month M of
//! year Y" for a batch of series. It serves from the cache when every
//! requested record is present; otherwise it fetches the whole year for all
//! requested series in one upstream call, writes every returned month into
//! the cache, and answers from the refreshed cache.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::RecordCache;
use crate::data::{decode, CpiRecord, SeriesRequest, UpstreamClient};
use crate::error::{RetrievalError, UpstreamError};
use crate::records::{derive_key, flatten_response};

/// Default deadline for one upstream fetch, decode included
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Cache-first retriever of monthly CPI records
///
/// Concurrent `retrieve` calls that miss the same entries each trigger their
/// own upstream fetch. The resulting writes are identical re-derivations of
/// the same data, so the last writer wins without changing the outcome, but
/// the upstream quota is spent twice.
#[derive(Debug)]
pub struct CpiRetriever<C, U> {
    cache: C,
    upstream: U,
    fetch_timeout: Duration,
}

impl<C, U> CpiRetriever<C, U>
where
    C: RecordCache<CpiRecord>,
    U: UpstreamClient,
{
    pub fn new(cache: C, upstream: U) -> Self {
        Self {
            cache,
            upstream,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Bound each upstream fetch by `timeout`
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns the CPI record of every requested series for `month` of `year`
    ///
    /// Duplicate series IDs are collapsed. On a partial cache hit the full
    /// year is re-fetched for every requested series, not only the missing
    /// ones.
    ///
    /// # Errors
    /// * `RetrievalError::Upstream` if the upstream call, its decoding, or a
    ///   cache write fails
    /// * `RetrievalError::IncompleteData` if upstream has no value for some
    ///   series in that month
    pub async fn retrieve(
        &self,
        year: &str,
        month: &str,
        series_ids: &[String],
    ) -> Result<BTreeMap<String, CpiRecord>, RetrievalError> {
        let request = SeriesRequest::new(year, month, series_ids.iter().cloned());
        self.retrieve_request(&request).await
    }

    /// Same as [`CpiRetriever::retrieve`] for an already-built request
    pub async fn retrieve_request(
        &self,
        request: &SeriesRequest,
    ) -> Result<BTreeMap<String, CpiRecord>, RetrievalError> {
        let requested = request.series_ids.len();
        info!(
            year = %request.year,
            month = %request.month,
            series = ?request.series_ids,
            "Retrieving CPI data"
        );

        let cached = self.lookup_cached(request);
        if cached.len() == requested {
            info!(records = requested, "Retrieved all requested CPI data from cache");
            return Ok(cached);
        }

        info!(
            hits = cached.len(),
            requested,
            "Cache incomplete, fetching full year from BLS API"
        );
        self.fetch_and_cache(&request.year, &request.series_list())
            .await?;

        let refreshed = self.lookup_cached(request);
        if refreshed.len() != requested {
            let missing: Vec<String> = request
                .series_ids
                .iter()
                .filter(|id| !refreshed.contains_key(*id))
                .cloned()
                .collect();
            warn!(
                year = %request.year,
                month = %request.month,
                missing = ?missing,
                "CPI data still missing after fetching from BLS API"
            );
            return Err(RetrievalError::IncompleteData {
                year: request.year.clone(),
                month: request.month.clone(),
                missing,
            });
        }

        info!(records = requested, "Retrieved CPI data after refreshing cache");
        Ok(refreshed)
    }

    /// Fetches a full year for `series_ids` and caches every returned month
    ///
    /// Returns the number of records written. Records are written in
    /// response order, so if upstream repeats a (year, month, series) the
    /// last occurrence is what stays cached. A response that decodes but
    /// carries no series writes nothing and still succeeds.
    pub async fn fetch_and_cache(
        &self,
        year: &str,
        series_ids: &[String],
    ) -> Result<usize, UpstreamError> {
        info!(year, series = ?series_ids, "Fetching CPI data from BLS API");

        let raw = tokio::time::timeout(
            self.fetch_timeout,
            self.upstream.fetch_year(series_ids, year, year),
        )
        .await
        .map_err(|_| UpstreamError::TimedOut(self.fetch_timeout))??;

        let response = decode(&raw)?;
        if !response.is_success() {
            warn!(
                status = %response.status,
                messages = ?response.messages,
                "BLS API did not fully process the request"
            );
        }

        let records = flatten_response(&response);
        for record in &records {
            let key = record.cache_key();
            self.cache.put(&key, record)?;
            debug!(key = %key, "Cached CPI record");
        }

        info!(
            year,
            records = records.len(),
            response_time_ms = response.response_time_ms,
            "Cached CPI data from BLS API"
        );
        Ok(records.len())
    }

    /// Looks up every requested series in the cache, keeping only hits
    fn lookup_cached(&self, request: &SeriesRequest) -> BTreeMap<String, CpiRecord> {
        let mut found = BTreeMap::new();
        for series_id in &request.series_ids {
            let key = derive_key(&request.year, &request.month, series_id);
            if let Some(record) = self.cache.get(&key) {
                debug!(key = %key, "Found cached CPI record");
                found.insert(series_id.clone(), record);
            }
        }
        found
    }
}
