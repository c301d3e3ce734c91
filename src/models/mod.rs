//! Core domain types: search filters, log documents, result pages.

pub mod records;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log severity levels, stored uppercase in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            _ => Err(()),
        }
    }
}

/// Sortable document fields. Unknown names fall back to `Timestamp` rather
/// than failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Timestamp,
    Level,
    StatusCode,
    ResponseTime,
    Endpoint,
}

impl SortField {
    pub fn parse_or_default(raw: &str) -> Self {
        match raw {
            "timestamp" | "@timestamp" => SortField::Timestamp,
            "level" => SortField::Level,
            "status_code" => SortField::StatusCode,
            "response_time" | "response_time_ms" => SortField::ResponseTime,
            "endpoint" => SortField::Endpoint,
            _ => SortField::Timestamp,
        }
    }

    /// Field name as it appears in stored documents.
    pub fn field_name(&self) -> &'static str {
        match self {
            SortField::Timestamp => "timestamp",
            SortField::Level => "level",
            SortField::StatusCode => "status_code",
            SortField::ResponseTime => "response_time_ms",
            SortField::Endpoint => "endpoint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Parsed form of the raw status-code filter string.
///
/// Accepts exact codes (`404`) and class shorthands (`2XX`, `4XX`, `5XX`,
/// case-insensitive). `ALL`, empty, and unparseable values mean no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCodeFilter {
    /// Range `[n, n + 100)` for a shorthand like `4XX` (n = 400).
    Class(u16),
    Exact(u16),
}

impl StatusCodeFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return None;
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "2XX" => Some(StatusCodeFilter::Class(200)),
            "4XX" => Some(StatusCodeFilter::Class(400)),
            "5XX" => Some(StatusCodeFilter::Class(500)),
            other => other.parse::<u16>().ok().map(StatusCodeFilter::Exact),
        }
    }
}

/// Validated search filters, the single input to query construction and
/// cache-key derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_query: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Raw status filter as received; parsing happens at query-build time so
    /// the cache key reflects exactly what the caller sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,

    #[serde(default)]
    pub sort_field: SortField,

    #[serde(default)]
    pub sort_order: SortOrder,

    pub page: u32,
    pub per_page: u32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            text_query: None,
            level: None,
            endpoint: None,
            status_code: None,
            server: None,
            date_from: None,
            date_to: None,
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            per_page: 50,
        }
    }
}

impl FilterParams {
    /// Filters that are actually set, for recording in search history.
    pub fn sparse_filters(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        if let Some(q) = &self.text_query {
            map.insert("query".into(), serde_json::Value::String(q.clone()));
        }
        if let Some(level) = &self.level {
            map.insert(
                "level".into(),
                serde_json::Value::String(level.to_string()),
            );
        }
        if let Some(endpoint) = &self.endpoint {
            map.insert(
                "endpoint".into(),
                serde_json::Value::String(endpoint.clone()),
            );
        }
        if let Some(status) = &self.status_code {
            map.insert(
                "status_code".into(),
                serde_json::Value::String(status.clone()),
            );
        }
        if let Some(server) = &self.server {
            map.insert("server".into(), serde_json::Value::String(server.clone()));
        }
        if let Some(from) = &self.date_from {
            map.insert(
                "date_from".into(),
                serde_json::Value::String(from.to_rfc3339()),
            );
        }
        if let Some(to) = &self.date_to {
            map.insert("date_to".into(), serde_json::Value::String(to.to_rfc3339()));
        }
        map
    }
}

/// A single log entry as stored in the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDocument {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
}

/// One page of search results plus pagination bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub results: Vec<LogDocument>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl SearchPage {
    pub fn new(results: Vec<LogDocument>, total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page as u64) as u32
        };
        Self {
            results,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("error", Some(LogLevel::Error))]
    #[case("ERROR", Some(LogLevel::Error))]
    #[case("warn", Some(LogLevel::Warning))]
    #[case("fatal", Some(LogLevel::Critical))]
    #[case("verbose", None)]
    fn test_level_parsing(#[case] raw: &str, #[case] expected: Option<LogLevel>) {
        assert_eq!(raw.parse::<LogLevel>().ok(), expected);
    }

    #[rstest]
    #[case("2XX", Some(StatusCodeFilter::Class(200)))]
    #[case("4xx", Some(StatusCodeFilter::Class(400)))]
    #[case("5XX", Some(StatusCodeFilter::Class(500)))]
    #[case("404", Some(StatusCodeFilter::Exact(404)))]
    #[case("ALL", None)]
    #[case("", None)]
    #[case("abc", None)]
    fn test_status_filter_parsing(#[case] raw: &str, #[case] expected: Option<StatusCodeFilter>) {
        assert_eq!(StatusCodeFilter::parse(raw), expected);
    }

    #[test]
    fn test_unknown_sort_field_falls_back_to_timestamp() {
        assert_eq!(SortField::parse_or_default("nonsense"), SortField::Timestamp);
        assert_eq!(
            SortField::parse_or_default("response_time"),
            SortField::ResponseTime
        );
    }

    #[test]
    fn test_page_math() {
        let page = SearchPage::new(Vec::new(), 101, 1, 50);
        assert_eq!(page.total_pages, 3);

        let page = SearchPage::new(Vec::new(), 100, 1, 50);
        assert_eq!(page.total_pages, 2);

        let page = SearchPage::new(Vec::new(), 0, 1, 50);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_sparse_filters_skips_unset_fields() {
        let params = FilterParams {
            text_query: Some("timeout".into()),
            level: Some(LogLevel::Error),
            ..Default::default()
        };
        let filters = params.sparse_filters();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters["level"], "ERROR");
        assert!(!filters.contains_key("endpoint"));
    }
}
