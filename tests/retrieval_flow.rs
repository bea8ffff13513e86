//! Integration tests for cache-first CPI retrieval
//!
//! Drives `CpiRetriever` through the public API with a recording fake
//! upstream, covering the cache-complete path, fetch-on-miss, upstream
//! failures and the incomplete-data outcome.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use cpi_search::cache::{CacheManager, MemoryCache, RecordCache};
use cpi_search::data::{CpiRecord, UpstreamClient};
use cpi_search::records::derive_key;
use cpi_search::{CpiRetriever, RetrievalError, UpstreamError};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One recorded `fetch_year` call
#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchCall {
    series_ids: Vec<String>,
    start_year: String,
    end_year: String,
}

/// What the fake upstream does when called
enum Behavior {
    Respond(String),
    HttpStatus(u16),
    Hang(Duration),
}

/// Fake upstream that records every call it receives
struct RecordingUpstream {
    behavior: Behavior,
    calls: Mutex<Vec<FetchCall>>,
}

impl RecordingUpstream {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn responding(body: String) -> Self {
        Self::new(Behavior::Respond(body))
    }

    fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

#[async_trait]
impl UpstreamClient for RecordingUpstream {
    async fn fetch_year(
        &self,
        series_ids: &[String],
        start_year: &str,
        end_year: &str,
    ) -> Result<String, UpstreamError> {
        self.calls.lock().expect("calls lock poisoned").push(FetchCall {
            series_ids: series_ids.to_vec(),
            start_year: start_year.to_string(),
            end_year: end_year.to_string(),
        });

        match &self.behavior {
            Behavior::Respond(body) => Ok(body.clone()),
            Behavior::HttpStatus(status) => Err(UpstreamError::HttpStatus(*status)),
            Behavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(String::new())
            }
        }
    }
}

/// Builds a successful BLS payload with twelve months per series.
///
/// Values are `<base>.<month index>`, except March which is `301.5` for every
/// series, matching the scenarios below.
fn full_year_response(year: &str, series_ids: &[&str]) -> String {
    let series: Vec<_> = series_ids
        .iter()
        .map(|id| {
            let data: Vec<_> = (0..12)
                .rev()
                .map(|i| {
                    let value = if MONTHS[i] == "March" {
                        "301.5".to_string()
                    } else {
                        format!("300.{}", i)
                    };
                    json!({
                        "year": year,
                        "period": format!("M{:02}", i + 1),
                        "periodName": MONTHS[i],
                        "value": value,
                        "footnotes": [{}]
                    })
                })
                .collect();
            json!({ "seriesID": id, "data": data })
        })
        .collect();

    json!({
        "status": "REQUEST_SUCCEEDED",
        "responseTime": 120,
        "message": [],
        "Results": { "series": series }
    })
    .to_string()
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn cached_record(series_id: &str, value: &str) -> CpiRecord {
    CpiRecord {
        series_id: series_id.to_string(),
        year: "2023".to_string(),
        month: "March".to_string(),
        cpi_value: value.to_string(),
        notes: Vec::new(),
    }
}

#[tokio::test]
async fn test_cache_miss_fetches_full_year_and_returns_record() {
    let cache: MemoryCache<CpiRecord> = MemoryCache::new();
    let upstream = RecordingUpstream::responding(full_year_response("2023", &["X"]));
    let retriever = CpiRetriever::new(&cache, &upstream);

    let result = retriever
        .retrieve("2023", "March", &ids(&["X"]))
        .await
        .expect("Retrieve should succeed");

    assert_eq!(result.len(), 1);
    assert_eq!(
        result["X"],
        CpiRecord {
            series_id: "X".to_string(),
            year: "2023".to_string(),
            month: "March".to_string(),
            cpi_value: "301.5".to_string(),
            notes: Vec::new(),
        }
    );

    assert_eq!(
        upstream.calls(),
        vec![FetchCall {
            series_ids: ids(&["X"]),
            start_year: "2023".to_string(),
            end_year: "2023".to_string(),
        }]
    );
    // Every month of the year is backfilled, not just the requested one
    assert_eq!(cache.len(), 12);
}

#[tokio::test]
async fn test_cache_complete_path_never_calls_upstream() {
    let cache: MemoryCache<CpiRecord> = MemoryCache::new();
    cache
        .put(&derive_key("2023", "March", "X"), &cached_record("X", "301.5"))
        .expect("Put should succeed");
    cache
        .put(&derive_key("2023", "March", "Y"), &cached_record("Y", "305.1"))
        .expect("Put should succeed");
    let upstream = RecordingUpstream::new(Behavior::HttpStatus(500));
    let retriever = CpiRetriever::new(&cache, &upstream);

    let result = retriever
        .retrieve("2023", "March", &ids(&["X", "Y"]))
        .await
        .expect("Retrieve should succeed from cache");

    assert_eq!(result.len(), 2);
    assert_eq!(result["X"].cpi_value, "301.5");
    assert_eq!(result["Y"].cpi_value, "305.1");
    assert!(upstream.calls().is_empty(), "Upstream must not be called");
    assert_eq!(cache.len(), 2, "Cache-complete path has no side effects");
}

#[tokio::test]
async fn test_partial_hit_refetches_all_requested_series() {
    let cache: MemoryCache<CpiRecord> = MemoryCache::new();
    cache
        .put(&derive_key("2023", "March", "X"), &cached_record("X", "301.5"))
        .expect("Put should succeed");
    let upstream = RecordingUpstream::responding(full_year_response("2023", &["X", "Y"]));
    let retriever = CpiRetriever::new(&cache, &upstream);

    let result = retriever
        .retrieve("2023", "March", &ids(&["Y", "X"]))
        .await
        .expect("Retrieve should succeed");

    assert_eq!(result.len(), 2);
    let calls = upstream.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].series_ids, ids(&["X", "Y"]));
    assert_eq!(cache.len(), 24);
}

#[tokio::test]
async fn test_absent_results_ends_in_incomplete_data() {
    let body = json!({
        "status": "REQUEST_NOT_PROCESSED",
        "responseTime": 0,
        "message": ["Request could not be serviced, as the daily threshold for total number of requests allocated to the user has been reached."]
    })
    .to_string();
    let cache: MemoryCache<CpiRecord> = MemoryCache::new();
    let upstream = RecordingUpstream::responding(body);
    let retriever = CpiRetriever::new(&cache, &upstream);

    let written = retriever
        .fetch_and_cache("2023", &ids(&["X"]))
        .await
        .expect("Fetch-and-cache should succeed on an empty response");
    assert_eq!(written, 0);

    let result = retriever.retrieve("2023", "March", &ids(&["X"])).await;

    match result {
        Err(RetrievalError::IncompleteData { missing, .. }) => {
            assert_eq!(missing, ids(&["X"]));
        }
        other => panic!("Expected IncompleteData, got {:?}", other),
    }
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_month_missing_upstream_ends_in_incomplete_data() {
    // Upstream only has January and February so far
    let body = json!({
        "status": "REQUEST_SUCCEEDED",
        "responseTime": 40,
        "message": [],
        "Results": {
            "series": [{
                "seriesID": "X",
                "data": [
                    {"year": "2024", "period": "M02", "periodName": "February", "value": "310.3", "footnotes": []},
                    {"year": "2024", "period": "M01", "periodName": "January", "value": "308.4", "footnotes": []}
                ]
            }]
        }
    })
    .to_string();
    let cache: MemoryCache<CpiRecord> = MemoryCache::new();
    let upstream = RecordingUpstream::responding(body);
    let retriever = CpiRetriever::new(&cache, &upstream);

    let result = retriever.retrieve("2024", "March", &ids(&["X"])).await;

    assert!(matches!(result, Err(RetrievalError::IncompleteData { .. })));
    // The months that do exist were still cached
    assert_eq!(cache.len(), 2);
    assert!(cache.get(&derive_key("2024", "January", "X")).is_some());
}

#[tokio::test]
async fn test_upstream_timeout_is_upstream_error_and_leaves_cache_untouched() {
    let cache: MemoryCache<CpiRecord> = MemoryCache::new();
    let upstream = RecordingUpstream::new(Behavior::Hang(Duration::from_secs(10)));
    let retriever =
        CpiRetriever::new(&cache, &upstream).with_fetch_timeout(Duration::from_millis(50));

    let result = retriever.retrieve("2023", "March", &ids(&["X"])).await;

    assert!(matches!(
        result,
        Err(RetrievalError::Upstream(UpstreamError::TimedOut(_)))
    ));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_upstream_http_failure_is_upstream_error() {
    let cache: MemoryCache<CpiRecord> = MemoryCache::new();
    let upstream = RecordingUpstream::new(Behavior::HttpStatus(503));
    let retriever = CpiRetriever::new(&cache, &upstream);

    let result = retriever.retrieve("2023", "March", &ids(&["X"])).await;

    assert!(matches!(
        result,
        Err(RetrievalError::Upstream(UpstreamError::HttpStatus(503)))
    ));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_surfaces_as_upstream_error() {
    let cache: MemoryCache<CpiRecord> = MemoryCache::new();
    let upstream = RecordingUpstream::responding("<html>Service Unavailable</html>".to_string());
    let retriever = CpiRetriever::new(&cache, &upstream);

    let result = retriever.retrieve("2023", "March", &ids(&["X"])).await;

    assert!(matches!(
        result,
        Err(RetrievalError::Upstream(UpstreamError::Decode(_)))
    ));
}

#[tokio::test]
async fn test_fetch_and_cache_is_idempotent() {
    let body = full_year_response("2023", &["X", "Y"]);

    let once: MemoryCache<CpiRecord> = MemoryCache::new();
    let upstream = RecordingUpstream::responding(body.clone());
    CpiRetriever::new(&once, &upstream)
        .fetch_and_cache("2023", &ids(&["X", "Y"]))
        .await
        .expect("Fetch should succeed");

    let twice: MemoryCache<CpiRecord> = MemoryCache::new();
    let retriever = CpiRetriever::new(&twice, &upstream);
    for _ in 0..2 {
        retriever
            .fetch_and_cache("2023", &ids(&["X", "Y"]))
            .await
            .expect("Fetch should succeed");
    }

    assert_eq!(once.keys(), twice.keys());
    for key in once.keys() {
        assert_eq!(once.get(&key), twice.get(&key), "Mismatch for {}", key);
    }
}

#[tokio::test]
async fn test_disk_cache_serves_second_lookup_without_upstream() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let first_upstream = RecordingUpstream::responding(full_year_response("2023", &["X"]));
    let first = CpiRetriever::new(
        CacheManager::with_dir(temp_dir.path().to_path_buf()),
        &first_upstream,
    );
    first
        .retrieve("2023", "March", &ids(&["X"]))
        .await
        .expect("First lookup should succeed");
    assert_eq!(first_upstream.calls().len(), 1);

    // A fresh process pointed at the same directory
    let second_upstream = RecordingUpstream::new(Behavior::HttpStatus(500));
    let second = CpiRetriever::new(
        CacheManager::with_dir(temp_dir.path().to_path_buf()),
        &second_upstream,
    );
    let result = second
        .retrieve("2023", "June", &ids(&["X"]))
        .await
        .expect("Second lookup should be served from disk");

    assert_eq!(result["X"].month, "June");
    assert_eq!(result["X"].cpi_value, "300.5");
    assert!(second_upstream.calls().is_empty());
}
