//! Application context and the search orchestrator.
//!
//! `AppContext` carries the injected collaborators (search backend, document
//! store, cache, metrics) so nothing in the crate reaches for globals.
//! `SearchOrchestrator` owns the request flows: cache-first search, scroll
//! export, dashboard statistics, and the cache-invalidation hooks around
//! writes.

use crate::cache::{derive_key, CacheStats, CacheStore, ResultCache};
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::export::{self, ExportPayload};
use crate::metrics::{PerformanceMonitor, SeriesSummary, GROUP_API, GROUP_SEARCH, GROUP_STORE};
use crate::models::records::{FileRecord, SavedSearch, SearchHistoryRecord};
use crate::models::{FilterParams, LogDocument, SearchPage, SortField, SortOrder};
use crate::query::{builder, Clause, SortSpec, StructuredQuery};
use crate::search::{
    AggregationRequest, AggregationResult, QueryExecutor, ScrollExporter, SearchBackend,
    TermBucket,
};
use crate::storage::DocumentStore;
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

const NS_SEARCH: &str = "search";
const NS_STATS: &str = "stats";
const NS_FILES: &str = "files";

/// Shared application state, built once at startup and injected everywhere.
pub struct AppContext {
    pub settings: Settings,
    pub backend: Arc<dyn SearchBackend>,
    pub store: Arc<dyn DocumentStore>,
    pub cache: Arc<ResultCache>,
    pub metrics: Arc<PerformanceMonitor>,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        backend: Arc<dyn SearchBackend>,
        store: Arc<dyn DocumentStore>,
        cache_store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            settings,
            backend,
            store,
            cache: Arc::new(ResultCache::new(cache_store)),
            metrics: Arc::new(PerformanceMonitor::default()),
        }
    }

    /// Fully in-memory context for tests and local development.
    pub fn in_memory(settings: Settings) -> Self {
        let capacity = settings.cache.max_capacity;
        Self::new(
            settings,
            Arc::new(crate::search::MemoryBackend::new()),
            Arc::new(crate::storage::MemoryDocumentStore::new()),
            Arc::new(crate::cache::MemoryCacheStore::new(capacity)),
        )
    }
}

/// A search result plus provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    #[serde(flatten)]
    pub page: SearchPage,
    pub from_cache: bool,
    pub took_ms: f64,
}

/// Dashboard statistics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_logs: u64,
    pub logs_24h: u64,
    /// Share of documents with status >= 500, in percent.
    pub error_rate_percent: f64,
    /// Mean latency over the last 24 hours.
    pub avg_response_time_ms: Option<f64>,
    /// Top three endpoints by mean latency over the last 24 hours.
    pub slowest_endpoints: Vec<TermBucket>,
    /// Distinct users seen in the last 24 hours.
    pub unique_users: u64,
    pub latest_error: Option<LogDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub search_backend: bool,
    pub document_store: bool,
    pub cache: bool,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub api: Vec<SeriesSummary>,
    pub search: Vec<SeriesSummary>,
    pub store: Vec<SeriesSummary>,
}

pub struct SearchOrchestrator {
    ctx: Arc<AppContext>,
    executor: QueryExecutor,
    exporter: ScrollExporter,
}

impl SearchOrchestrator {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let executor = QueryExecutor::new(
            ctx.backend.clone(),
            ctx.metrics.clone(),
            ctx.settings.search_timeout(),
        );
        let exporter = ScrollExporter::new(ctx.backend.clone(), ctx.settings.search_timeout());
        Self {
            ctx,
            executor,
            exporter,
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Cache-first search: derive key, look up, execute on miss, record
    /// history, store the page. History and cache writes are best-effort;
    /// only validation and backend execution can fail the request.
    #[instrument(skip(self, params), fields(page = params.page, per_page = params.per_page))]
    pub async fn search(&self, user_id: &str, params: &FilterParams) -> Result<SearchOutcome> {
        validate_window(params)?;

        let query = builder::build(params);
        let key = derive_key(NS_SEARCH, params)?;

        if let Some(page) = self.ctx.cache.get::<SearchPage>(&key).await {
            info!(total = page.total, "served search from cache");
            return Ok(SearchOutcome {
                page,
                from_cache: true,
                took_ms: 0.0,
            });
        }

        let executed = self.executor.execute("search_logs", &query).await?;
        let page = SearchPage::new(
            executed.hits.hits,
            executed.hits.total,
            params.page,
            params.per_page,
        );

        self.record_history(user_id, params, page.total).await;
        self.ctx
            .cache
            .set(&key, &page, self.ctx.settings.default_cache_ttl())
            .await;

        Ok(SearchOutcome {
            page,
            from_cache: false,
            took_ms: executed.elapsed_ms,
        })
    }

    async fn record_history(&self, user_id: &str, params: &FilterParams, results: u64) {
        let started = Instant::now();
        let record = SearchHistoryRecord::new(
            user_id,
            params.text_query.clone().unwrap_or_default(),
            params.sparse_filters(),
            results,
        );
        if let Err(error) = self.ctx.store.insert_history(record).await {
            warn!(%error, "failed to record search history");
        }
        self.ctx.metrics.record(
            &format!("{}:insert_history", GROUP_STORE),
            started.elapsed().as_secs_f64() * 1000.0,
        );
    }

    /// Exports every matching document as CSV, gzip-compressed above the
    /// configured threshold. Pagination fields are ignored.
    #[instrument(skip(self, params))]
    pub async fn export(&self, params: &FilterParams) -> Result<ExportPayload> {
        let query = builder::build(params);
        let started = Instant::now();

        let docs = self
            .exporter
            .export_all(
                &query,
                self.ctx.settings.search.scroll_batch_size,
                self.ctx.settings.export.max_documents,
            )
            .await?;

        self.ctx.metrics.record(
            &format!("{}:export_logs", GROUP_SEARCH),
            started.elapsed().as_secs_f64() * 1000.0,
        );
        info!(documents = docs.len(), "export collected");

        export::build_payload(
            export::to_csv(&docs),
            self.ctx.settings.export.compression_threshold_bytes,
        )
    }

    /// Dashboard statistics, memoized with the short stats TTL.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let key = derive_key(NS_STATS, &"dashboard")?;
        if let Some(stats) = self.ctx.cache.get::<DashboardStats>(&key).await {
            return Ok(stats);
        }

        let stats = self.compute_dashboard_stats().await?;
        self.ctx
            .cache
            .set(&key, &stats, self.ctx.settings.stats_cache_ttl())
            .await;
        Ok(stats)
    }

    async fn compute_dashboard_stats(&self) -> Result<DashboardStats> {
        let total_logs = self.executor.count("stats_total", &[]).await?;

        // All time-scoped stats share the same trailing 24-hour window.
        let day_ago = Utc::now() - ChronoDuration::hours(24);
        let last_24h = [Clause::Range {
            field: "timestamp".to_string(),
            gte: Some(json!(day_ago.to_rfc3339())),
            lt: None,
            lte: None,
        }];
        let logs_24h = self.executor.count("stats_24h", &last_24h).await?;

        let server_errors = self
            .executor
            .count(
                "stats_errors",
                &[Clause::Range {
                    field: "status_code".to_string(),
                    gte: Some(json!(500)),
                    lt: None,
                    lte: None,
                }],
            )
            .await?;
        let error_rate_percent = if total_logs == 0 {
            0.0
        } else {
            (server_errors as f64 / total_logs as f64 * 10_000.0).round() / 100.0
        };

        let avg_response_time_ms = match self
            .executor
            .aggregate(
                "stats_avg_latency",
                &last_24h,
                &AggregationRequest::Average {
                    field: "response_time_ms".to_string(),
                },
            )
            .await?
        {
            AggregationResult::Average(avg) => avg,
            _ => None,
        };

        let slowest_endpoints = match self
            .executor
            .aggregate(
                "stats_slowest",
                &last_24h,
                &AggregationRequest::TermsByAverage {
                    field: "endpoint".to_string(),
                    avg_field: "response_time_ms".to_string(),
                    size: 3,
                },
            )
            .await?
        {
            AggregationResult::Buckets(buckets) => buckets,
            _ => Vec::new(),
        };

        let unique_users = match self
            .executor
            .aggregate(
                "stats_unique_users",
                &last_24h,
                &AggregationRequest::Cardinality {
                    field: "user_id".to_string(),
                },
            )
            .await?
        {
            AggregationResult::Cardinality(count) => count,
            _ => 0,
        };

        let latest_error_query = StructuredQuery {
            clauses: vec![Clause::Terms {
                field: "level".to_string(),
                values: vec![json!("ERROR"), json!("CRITICAL")],
            }],
            sort: SortSpec {
                field: SortField::Timestamp,
                order: SortOrder::Desc,
            },
            offset: 0,
            limit: 1,
            projection: crate::query::RESULT_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        };
        let latest_error = self
            .executor
            .execute("stats_latest_error", &latest_error_query)
            .await?
            .hits
            .hits
            .into_iter()
            .next();

        Ok(DashboardStats {
            total_logs,
            logs_24h,
            error_rate_percent,
            avg_response_time_ms,
            slowest_endpoints,
            unique_users,
            latest_error,
        })
    }

    /// Registers an uploaded file, then invalidates the namespaces its
    /// contents affect. The write always lands before invalidation so no
    /// reader can re-cache the pre-write state.
    pub async fn register_upload(
        &self,
        filename: &str,
        size_bytes: u64,
        uploaded_by: &str,
    ) -> Result<FileRecord> {
        let record = FileRecord::new(filename, size_bytes, uploaded_by);
        self.ctx.store.insert_file(record.clone()).await?;
        self.invalidate_after_write().await;
        info!(file_id = %record.id, filename, "registered upload");
        Ok(record)
    }

    pub async fn complete_upload(&self, file_id: &str, lines_indexed: u64) -> Result<()> {
        if !self.ctx.store.mark_file_indexed(file_id, lines_indexed).await? {
            return Err(AppError::not_found(format!("file {}", file_id)));
        }
        self.invalidate_after_write().await;
        Ok(())
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        if !self.ctx.store.delete_file(file_id).await? {
            return Err(AppError::not_found(format!("file {}", file_id)));
        }
        self.invalidate_after_write().await;
        info!(file_id, "deleted file");
        Ok(())
    }

    async fn invalidate_after_write(&self) {
        self.ctx.cache.invalidate_namespace(NS_FILES).await;
        self.ctx.cache.invalidate_namespace(NS_STATS).await;
        self.ctx.cache.invalidate_namespace(NS_SEARCH).await;
    }

    /// Recent uploads, memoized under the `files` namespace.
    pub async fn list_files(&self, limit: usize) -> Result<Vec<FileRecord>> {
        let key = derive_key(NS_FILES, &limit)?;
        if let Some(files) = self.ctx.cache.get::<Vec<FileRecord>>(&key).await {
            return Ok(files);
        }

        let files = self.ctx.store.list_files(limit).await?;
        self.ctx
            .cache
            .set(&key, &files, self.ctx.settings.default_cache_ttl())
            .await;
        Ok(files)
    }

    pub async fn recent_searches(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<SearchHistoryRecord>> {
        self.ctx
            .store
            .recent_history(user_id, self.ctx.settings.history.recent_limit)
            .await
    }

    /// Drops history older than the configured retention window.
    pub async fn purge_history(&self) -> Result<u64> {
        let cutoff = Utc::now() - ChronoDuration::days(self.ctx.settings.history.retention_days);
        let purged = self.ctx.store.purge_history_before(cutoff).await?;
        if purged > 0 {
            info!(purged, "purged expired search history");
        }
        Ok(purged)
    }

    pub async fn save_search(
        &self,
        user_id: &str,
        name: &str,
        params: &FilterParams,
    ) -> Result<SavedSearch> {
        if name.trim().is_empty() {
            return Err(AppError::validation("saved search name must not be empty"));
        }
        let record = SavedSearch::new(user_id, name.trim(), params.sparse_filters());
        self.ctx.store.insert_saved_search(record.clone()).await?;
        Ok(record)
    }

    pub async fn list_saved_searches(&self, user_id: &str) -> Result<Vec<SavedSearch>> {
        self.ctx.store.list_saved_searches(user_id).await
    }

    /// Fetches a saved search and stamps its last-used time.
    pub async fn use_saved_search(&self, id: &str) -> Result<SavedSearch> {
        let record = self
            .ctx
            .store
            .get_saved_search(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("saved search {}", id)))?;
        self.ctx.store.touch_saved_search(id).await?;
        Ok(record)
    }

    pub async fn delete_saved_search(&self, id: &str) -> Result<()> {
        if !self.ctx.store.delete_saved_search(id).await? {
            return Err(AppError::not_found(format!("saved search {}", id)));
        }
        Ok(())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.ctx.cache.stats()
    }

    pub fn reset_cache_stats(&self) {
        self.ctx.cache.reset_stats();
    }

    pub async fn invalidate_namespace(&self, namespace: &str) -> u64 {
        self.ctx.cache.invalidate_namespace(namespace).await
    }

    pub fn performance_report(&self) -> PerformanceReport {
        PerformanceReport {
            api: self.ctx.metrics.summaries_for_group(GROUP_API),
            search: self.ctx.metrics.summaries_for_group(GROUP_SEARCH),
            store: self.ctx.metrics.summaries_for_group(GROUP_STORE),
        }
    }

    pub async fn health(&self) -> HealthReport {
        let search_backend = self.ctx.backend.ping().await.is_ok();
        let document_store = self.ctx.store.ping().await.is_ok();
        let cache = self.ctx.cache.ping().await;
        // A dead cache degrades performance but the service still works.
        let status = if search_backend && document_store {
            "ok"
        } else {
            "degraded"
        };
        HealthReport {
            search_backend,
            document_store,
            cache,
            status,
        }
    }
}

fn validate_window(params: &FilterParams) -> Result<()> {
    if params.page == 0 {
        return Err(AppError::validation("page must be greater than 0"));
    }
    if params.per_page == 0 {
        return Err(AppError::validation("per_page must be greater than 0"));
    }
    if let (Some(from), Some(to)) = (params.date_from, params.date_to) {
        if from > to {
            return Err(AppError::validation("date_from must not be after date_to"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_validation() {
        let params = FilterParams {
            page: 0,
            ..Default::default()
        };
        assert!(validate_window(&params).is_err());

        let params = FilterParams {
            date_from: Some(Utc::now()),
            date_to: Some(Utc::now() - ChronoDuration::hours(1)),
            ..Default::default()
        };
        assert!(validate_window(&params).is_err());

        assert!(validate_window(&FilterParams::default()).is_ok());
    }
}
