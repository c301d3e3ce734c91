//! Request DTOs, response envelopes, and the handler functions an HTTP
//! router binds to.
//!
//! Requests arrive loose (everything optional, strings untyped) and are
//! validated into [`FilterParams`] here. Unknown levels are rejected;
//! unknown sort fields, sort orders and status shorthands silently fall
//! back, matching the dashboard UI contract. Handlers record their latency
//! under `api:{operation}`.

use crate::cache::CacheStats;
use crate::error::{AppError, ErrorEnvelope, Result};
use crate::export::ExportPayload;
use crate::metrics::GROUP_API;
use crate::models::records::{FileRecord, SavedSearch, SearchHistoryRecord};
use crate::models::{FilterParams, LogLevel, SortField, SortOrder};
use crate::orchestrator::{
    DashboardStats, HealthReport, PerformanceReport, SearchOrchestrator, SearchOutcome,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use validator::Validate;

pub const ANONYMOUS_USER: &str = "anonymous";

/// Raw search request as received from the client.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub level: Option<String>,
    pub endpoint: Option<String>,
    pub status_code: Option<String>,
    pub server: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    #[validate(range(min = 1, message = "page must be greater than 0"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, message = "per_page must be greater than 0"))]
    pub per_page: Option<u32>,
    pub user_id: Option<String>,
}

impl SearchRequest {
    /// Validates and converts into typed filters. `per_page` above the cap
    /// is clamped rather than rejected.
    pub fn into_params(self, max_per_page: u32) -> Result<FilterParams> {
        self.validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let level = match self.level.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) if raw.eq_ignore_ascii_case("all") => None,
            Some(raw) => Some(
                raw.parse::<LogLevel>()
                    .map_err(|_| AppError::validation(format!("unknown log level: {}", raw)))?,
            ),
        };

        let date_from = self
            .date_from
            .as_deref()
            .map(|raw| parse_date(raw, false))
            .transpose()?;
        let date_to = self
            .date_to
            .as_deref()
            .map(|raw| parse_date(raw, true))
            .transpose()?;
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(AppError::validation("date_from must not be after date_to"));
            }
        }

        Ok(FilterParams {
            text_query: self.query,
            level,
            endpoint: self.endpoint,
            status_code: self.status_code,
            server: self.server,
            date_from,
            date_to,
            sort_field: self
                .sort_field
                .as_deref()
                .map(SortField::parse_or_default)
                .unwrap_or_default(),
            sort_order: self
                .sort_order
                .as_deref()
                .map(SortOrder::parse_or_default)
                .unwrap_or_default(),
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(50).min(max_per_page),
        })
    }

    pub fn user(&self) -> &str {
        self.user_id.as_deref().unwrap_or(ANONYMOUS_USER)
    }
}

fn parse_date(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let time = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        if let Some(naive) = time {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(AppError::validation(format!("unparseable date: {}", raw)))
}

/// `{"success": true, "data": ...}` wrapper used by every handler.
pub fn success_envelope<T: Serialize>(data: &T) -> serde_json::Value {
    json!({ "success": true, "data": data })
}

/// Client-facing error body; internal detail only with `debug_errors`.
pub fn error_envelope(error: &AppError, debug_errors: bool) -> serde_json::Value {
    serde_json::to_value(ErrorEnvelope::from_error(error, debug_errors))
        .unwrap_or_else(|_| json!({ "success": false, "error": "Internal server error", "code": 500 }))
}

async fn timed<T>(
    orchestrator: &SearchOrchestrator,
    operation: &str,
    call: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    let started = Instant::now();
    let outcome = call.await;
    orchestrator.context().metrics.record(
        &format!("{}:{}", GROUP_API, operation),
        started.elapsed().as_secs_f64() * 1000.0,
    );
    outcome
}

pub async fn search_logs(
    orchestrator: &SearchOrchestrator,
    request: SearchRequest,
) -> Result<SearchOutcome> {
    let user = request.user().to_string();
    let max = orchestrator.context().settings.search.max_per_page;
    let params = request.into_params(max)?;
    timed(orchestrator, "search", orchestrator.search(&user, &params)).await
}

pub async fn export_logs(
    orchestrator: &SearchOrchestrator,
    request: SearchRequest,
) -> Result<ExportPayload> {
    let max = orchestrator.context().settings.search.max_per_page;
    let params = request.into_params(max)?;
    timed(orchestrator, "export", orchestrator.export(&params)).await
}

pub async fn dashboard_stats(orchestrator: &SearchOrchestrator) -> Result<DashboardStats> {
    timed(orchestrator, "stats", orchestrator.dashboard_stats()).await
}

pub async fn recent_uploads(
    orchestrator: &SearchOrchestrator,
    limit: usize,
) -> Result<Vec<FileRecord>> {
    timed(orchestrator, "files", orchestrator.list_files(limit)).await
}

pub async fn recent_searches(
    orchestrator: &SearchOrchestrator,
    user_id: Option<&str>,
) -> Result<Vec<SearchHistoryRecord>> {
    orchestrator.recent_searches(user_id).await
}

pub async fn save_search(
    orchestrator: &SearchOrchestrator,
    request: SearchRequest,
    name: &str,
) -> Result<SavedSearch> {
    let user = request.user().to_string();
    let max = orchestrator.context().settings.search.max_per_page;
    let params = request.into_params(max)?;
    orchestrator.save_search(&user, name, &params).await
}

pub async fn saved_searches(
    orchestrator: &SearchOrchestrator,
    user_id: &str,
) -> Result<Vec<SavedSearch>> {
    orchestrator.list_saved_searches(user_id).await
}

pub async fn use_saved_search(
    orchestrator: &SearchOrchestrator,
    id: &str,
) -> Result<SavedSearch> {
    orchestrator.use_saved_search(id).await
}

pub async fn delete_saved_search(orchestrator: &SearchOrchestrator, id: &str) -> Result<()> {
    orchestrator.delete_saved_search(id).await
}

pub fn cache_stats(orchestrator: &SearchOrchestrator) -> CacheStats {
    orchestrator.cache_stats()
}

pub async fn clear_cache(orchestrator: &SearchOrchestrator, namespace: &str) -> u64 {
    orchestrator.invalidate_namespace(namespace).await
}

pub fn performance(orchestrator: &SearchOrchestrator) -> PerformanceReport {
    orchestrator.performance_report()
}

pub async fn health(orchestrator: &SearchOrchestrator) -> HealthReport {
    orchestrator.health().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_applied() {
        let params = SearchRequest::default().into_params(100).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 50);
        assert_eq!(params.sort_field, SortField::Timestamp);
        assert_eq!(params.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_per_page_is_clamped_not_rejected() {
        let request = SearchRequest {
            per_page: Some(500),
            ..Default::default()
        };
        let params = request.into_params(100).unwrap();
        assert_eq!(params.per_page, 100);
    }

    #[test]
    fn test_zero_page_rejected() {
        let request = SearchRequest {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            request.into_params(100),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_level_rejected_but_unknown_sort_falls_back() {
        let request = SearchRequest {
            level: Some("verbose".into()),
            ..Default::default()
        };
        assert!(request.into_params(100).is_err());

        let request = SearchRequest {
            sort_field: Some("nonsense".into()),
            sort_order: Some("sideways".into()),
            ..Default::default()
        };
        let params = request.into_params(100).unwrap();
        assert_eq!(params.sort_field, SortField::Timestamp);
        assert_eq!(params.sort_order, SortOrder::Desc);
    }

    #[rstest]
    #[case("2026-08-01T10:30:00Z")]
    #[case("2026-08-01T10:30:00+02:00")]
    #[case("2026-08-01T10:30:00")]
    #[case("2026-08-01")]
    fn test_accepted_date_formats(#[case] raw: &str) {
        assert!(parse_date(raw, false).is_ok());
    }

    #[test]
    fn test_date_only_bounds() {
        let from = parse_date("2026-08-01", false).unwrap();
        let to = parse_date("2026-08-01", true).unwrap();
        assert!(from < to);
        assert_eq!(to.format("%H:%M:%S").to_string(), "23:59:59");
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let request = SearchRequest {
            date_from: Some("2026-08-02".into()),
            date_to: Some("2026-08-01".into()),
            ..Default::default()
        };
        assert!(request.into_params(100).is_err());
    }

    #[test]
    fn test_envelopes() {
        let ok = success_envelope(&json!({"total": 3}));
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["total"], 3);

        let err = error_envelope(&AppError::validation("bad page"), false);
        assert_eq!(err["success"], false);
        assert_eq!(err["code"], 400);
    }

    #[test]
    fn test_all_level_means_no_filter() {
        let request = SearchRequest {
            level: Some("ALL".into()),
            ..Default::default()
        };
        assert_eq!(request.into_params(100).unwrap().level, None);
    }
}
