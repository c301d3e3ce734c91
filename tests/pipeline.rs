//! End-to-end flows over the in-memory backends: cache-first search,
//! invalidation on writes, scroll export, degraded-cache behavior, and the
//! dashboard statistics block.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use flate2::read::GzDecoder;
use logboard::api::{self, SearchRequest};
use logboard::cache::{CacheStore, MemoryCacheStore};
use logboard::error::{AppError, Result};
use logboard::models::LogDocument;
use logboard::search::MemoryBackend;
use logboard::storage::MemoryDocumentStore;
use logboard::{AppContext, SearchOrchestrator, Settings};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

fn doc(offset_seconds: i64, level: &str, status: u16, message: &str) -> LogDocument {
    LogDocument {
        timestamp: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap()
            + ChronoDuration::seconds(offset_seconds),
        level: level.to_string(),
        endpoint: Some("/api/orders".to_string()),
        status_code: Some(status),
        response_time_ms: Some(25.0),
        message: message.to_string(),
        server: Some("web-1".to_string()),
        user_id: Some("u-1".to_string()),
        client_ip: None,
    }
}

struct Harness {
    backend: Arc<MemoryBackend>,
    orchestrator: SearchOrchestrator,
}

fn harness(settings: Settings) -> Harness {
    let backend = Arc::new(MemoryBackend::new());
    let ctx = AppContext::new(
        settings,
        backend.clone(),
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(MemoryCacheStore::default()),
    );
    Harness {
        backend,
        orchestrator: SearchOrchestrator::new(Arc::new(ctx)),
    }
}

#[tokio::test]
async fn test_search_miss_then_hit() {
    let h = harness(Settings::default());
    h.backend.index((0..10).map(|i| doc(i, "INFO", 200, "ok")));

    let request = SearchRequest {
        per_page: Some(5),
        ..Default::default()
    };
    let first = api::search_logs(&h.orchestrator, request.clone()).await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.page.total, 10);
    assert_eq!(first.page.results.len(), 5);
    assert_eq!(first.page.total_pages, 2);

    let second = api::search_logs(&h.orchestrator, request).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.page.total, 10);

    let stats = h.orchestrator.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);

    // History is recorded once, on the miss.
    let history = h.orchestrator.recent_searches(None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].results_count, 10);
    assert_eq!(history[0].user_id, "anonymous");
}

#[tokio::test]
async fn test_upload_invalidates_cached_searches() {
    let h = harness(Settings::default());
    h.backend.index([doc(0, "INFO", 200, "ok")]);

    let request = SearchRequest::default();
    let before = api::search_logs(&h.orchestrator, request.clone()).await.unwrap();
    assert_eq!(before.page.total, 1);

    // New upload lands in the store first, then caches are invalidated.
    h.orchestrator
        .register_upload("fresh.log", 1024, "alice")
        .await
        .unwrap();
    h.backend.index([doc(1, "INFO", 200, "fresh line")]);

    let after = api::search_logs(&h.orchestrator, request).await.unwrap();
    assert!(!after.from_cache);
    assert_eq!(after.page.total, 2);
}

#[tokio::test]
async fn test_export_is_complete_and_releases_cursor() {
    let settings = Settings::default();
    assert_eq!(settings.search.scroll_batch_size, 1000);

    let h = harness(settings);
    h.backend.index((0..2500).map(|i| doc(i, "INFO", 200, "line")));

    let payload = api::export_logs(&h.orchestrator, SearchRequest::default())
        .await
        .unwrap();
    assert!(payload.gzipped);

    let mut csv = String::new();
    GzDecoder::new(payload.body.as_slice())
        .read_to_string(&mut csv)
        .unwrap();
    // Header plus one line per document.
    assert_eq!(csv.lines().count(), 2501);

    assert_eq!(h.backend.released_cursors(), 1);
    assert_eq!(h.backend.open_cursors(), 0);
}

#[tokio::test]
async fn test_export_ceiling() {
    let mut settings = Settings::default();
    settings.export.max_documents = 100;
    let h = harness(settings);
    h.backend.index((0..500).map(|i| doc(i, "INFO", 200, "line")));

    let error = api::export_logs(&h.orchestrator, SearchRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::ResourceExhausted(_)));
    assert_eq!(h.backend.open_cursors(), 0);
}

struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(AppError::cache_error("connection refused"))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
        Err(AppError::cache_error("connection refused"))
    }

    async fn delete_prefix(&self, _prefix: &str) -> Result<u64> {
        Err(AppError::cache_error("connection refused"))
    }

    async fn ping(&self) -> Result<()> {
        Err(AppError::cache_error("connection refused"))
    }
}

#[tokio::test]
async fn test_dead_cache_never_fails_a_search() {
    let backend = Arc::new(MemoryBackend::new());
    backend.index([doc(0, "ERROR", 500, "boom")]);
    let ctx = AppContext::new(
        Settings::default(),
        backend,
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(FailingCacheStore),
    );
    let orchestrator = SearchOrchestrator::new(Arc::new(ctx));

    let request = SearchRequest::default();
    let first = api::search_logs(&orchestrator, request.clone()).await.unwrap();
    let second = api::search_logs(&orchestrator, request).await.unwrap();
    assert!(!first.from_cache);
    assert!(!second.from_cache);
    assert_eq!(second.page.total, 1);

    let health = api::health(&orchestrator).await;
    assert!(!health.cache);
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_per_page_clamped_end_to_end() {
    let h = harness(Settings::default());
    h.backend.index((0..300).map(|i| doc(i, "INFO", 200, "ok")));

    let request = SearchRequest {
        per_page: Some(500),
        ..Default::default()
    };
    let outcome = api::search_logs(&h.orchestrator, request).await.unwrap();
    assert_eq!(outcome.page.per_page, 100);
    assert_eq!(outcome.page.results.len(), 100);
    assert_eq!(outcome.page.total, 300);
}

#[tokio::test]
async fn test_filtered_search_with_status_class() {
    let h = harness(Settings::default());
    h.backend.index([
        doc(0, "INFO", 200, "checkout ok"),
        doc(1, "ERROR", 500, "checkout timeout"),
        doc(2, "ERROR", 502, "upstream gone"),
        doc(3, "WARNING", 404, "missing page"),
    ]);

    let request = SearchRequest {
        status_code: Some("5XX".into()),
        ..Default::default()
    };
    let outcome = api::search_logs(&h.orchestrator, request).await.unwrap();
    assert_eq!(outcome.page.total, 2);

    // Invalid shorthand matches everything instead of failing.
    let request = SearchRequest {
        status_code: Some("weird".into()),
        ..Default::default()
    };
    let outcome = api::search_logs(&h.orchestrator, request).await.unwrap();
    assert_eq!(outcome.page.total, 4);
}

#[tokio::test]
async fn test_dashboard_stats_block() {
    let h = harness(Settings::default());
    let now = Utc::now();
    let mut slow = doc(0, "INFO", 200, "ok");
    slow.timestamp = now - ChronoDuration::minutes(5);
    slow.endpoint = Some("/api/slow".to_string());
    slow.response_time_ms = Some(800.0);
    let mut boom = doc(1, "CRITICAL", 500, "db down");
    boom.timestamp = now - ChronoDuration::minutes(1);
    boom.user_id = Some("u-2".to_string());
    let mut stale = doc(2, "INFO", 200, "old entry");
    stale.timestamp = now - ChronoDuration::days(3);
    h.backend.index([slow, boom, stale]);

    let stats = api::dashboard_stats(&h.orchestrator).await.unwrap();
    assert_eq!(stats.total_logs, 3);
    assert_eq!(stats.logs_24h, 2);
    assert!((stats.error_rate_percent - 33.33).abs() < 0.01);
    assert_eq!(stats.unique_users, 2);
    assert_eq!(stats.slowest_endpoints[0].key, "/api/slow");
    assert_eq!(
        stats.latest_error.as_ref().map(|d| d.message.as_str()),
        Some("db down")
    );

    // Second read is served from the stats namespace.
    let before = h.orchestrator.cache_stats().hits;
    api::dashboard_stats(&h.orchestrator).await.unwrap();
    assert_eq!(h.orchestrator.cache_stats().hits, before + 1);
}

#[tokio::test]
async fn test_dashboard_aggregates_exclude_out_of_window_documents() {
    let h = harness(Settings::default());
    let now = Utc::now();
    let mut fresh = doc(0, "INFO", 200, "recent traffic");
    fresh.timestamp = now - ChronoDuration::minutes(10);
    fresh.endpoint = Some("/api/fresh".to_string());
    fresh.response_time_ms = Some(10.0);
    fresh.user_id = Some("u-fresh".to_string());
    let mut ancient = doc(1, "INFO", 200, "legacy traffic");
    ancient.timestamp = now - ChronoDuration::days(3);
    ancient.endpoint = Some("/api/legacy".to_string());
    ancient.response_time_ms = Some(10_000.0);
    ancient.user_id = Some("u-old".to_string());
    h.backend.index([fresh, ancient]);

    let stats = api::dashboard_stats(&h.orchestrator).await.unwrap();
    assert_eq!(stats.total_logs, 2);
    assert_eq!(stats.logs_24h, 1);
    // Latency, endpoint ranking and user cardinality only see the window.
    assert_eq!(stats.unique_users, 1);
    assert_eq!(stats.avg_response_time_ms, Some(10.0));
    assert_eq!(stats.slowest_endpoints.len(), 1);
    assert_eq!(stats.slowest_endpoints[0].key, "/api/fresh");
}

#[tokio::test]
async fn test_unavailable_backend_surfaces_typed_error() {
    let h = harness(Settings::default());
    h.backend.set_unavailable(true);

    let error = api::search_logs(&h.orchestrator, SearchRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::SearchBackend { .. }));

    let envelope = api::error_envelope(&error, false);
    assert_eq!(envelope["code"], 500);
    assert_eq!(envelope["error"], "Internal server error");
}

#[tokio::test]
async fn test_saved_search_round_trip() {
    let h = harness(Settings::default());

    let request = SearchRequest {
        query: Some("timeout".into()),
        status_code: Some("5XX".into()),
        user_id: Some("alice".into()),
        ..Default::default()
    };
    let saved = api::save_search(&h.orchestrator, request, "checkout failures")
        .await
        .unwrap();

    let listed = api::saved_searches(&h.orchestrator, "alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "checkout failures");
    assert!(listed[0].last_used_at.is_none());

    let used = api::use_saved_search(&h.orchestrator, &saved.id).await.unwrap();
    assert_eq!(used.filters["status_code"], "5XX");
    let listed = api::saved_searches(&h.orchestrator, "alice").await.unwrap();
    assert!(listed[0].last_used_at.is_some());

    api::delete_saved_search(&h.orchestrator, &saved.id)
        .await
        .unwrap();
    let missing = api::use_saved_search(&h.orchestrator, &saved.id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_file_lifecycle_and_listing_cache() {
    let h = harness(Settings::default());

    let record = h
        .orchestrator
        .register_upload("app.log", 4096, "alice")
        .await
        .unwrap();
    h.orchestrator
        .complete_upload(&record.id, 250)
        .await
        .unwrap();

    let files = api::recent_uploads(&h.orchestrator, 10).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].lines_indexed, 250);

    h.orchestrator.delete_file(&record.id).await.unwrap();
    // Deletion invalidated the files namespace, so the listing is fresh.
    let files = api::recent_uploads(&h.orchestrator, 10).await.unwrap();
    assert!(files.is_empty());

    let missing = h.orchestrator.delete_file(&record.id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_api_latency_is_recorded() {
    let h = harness(Settings::default());
    h.backend.index([doc(0, "INFO", 200, "ok")]);

    api::search_logs(&h.orchestrator, SearchRequest::default())
        .await
        .unwrap();

    let report = api::performance(&h.orchestrator);
    assert!(report.api.iter().any(|s| s.name == "api:search"));
    assert!(report.search.iter().any(|s| s.name == "search:search_logs"));
    assert!(report.store.iter().any(|s| s.name == "store:insert_history"));
}
