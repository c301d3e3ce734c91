//! Layered runtime configuration.
//!
//! Defaults are overridden by an optional TOML file, which is overridden by
//! `LOGBOARD__*` environment variables (e.g. `LOGBOARD__SEARCH__TIMEOUT_SECONDS`).

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub search: SearchSettings,

    #[validate(nested)]
    pub store: StoreSettings,

    #[validate(nested)]
    pub cache: CacheSettings,

    #[validate(nested)]
    pub export: ExportSettings,

    #[validate(nested)]
    pub history: HistorySettings,

    #[validate(nested)]
    pub telemetry: TelemetrySettings,

    /// Expose internal error detail in error envelopes. Off in production.
    #[serde(default)]
    pub debug_errors: bool,
}

/// Search-engine connection and query limits.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchSettings {
    #[validate(length(min = 1, max = 500))]
    pub url: String,

    /// Index pattern all queries run against.
    #[validate(length(min = 1, max = 200))]
    pub index_pattern: String,

    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,

    #[validate(range(min = 1, max = 10000))]
    pub scroll_batch_size: usize,

    #[validate(range(min = 1, max = 3600))]
    pub scroll_window_seconds: u64,

    /// Hard cap applied to `per_page`; requests above it are clamped.
    #[validate(range(min = 1, max = 1000))]
    pub max_per_page: u32,
}

/// Document-store connection pool.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreSettings {
    #[validate(length(min = 1, max = 500))]
    pub uri: String,

    #[validate(range(min = 1, max = 60))]
    pub connect_timeout_seconds: u64,

    #[validate(range(min = 1, max = 200))]
    pub max_pool_size: u32,

    #[validate(range(min = 1, max = 100))]
    pub min_pool_size: u32,

    #[validate(range(min = 1, max = 3600))]
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheSettings {
    #[validate(length(min = 1, max = 200))]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    #[validate(range(min = 1, max = 60))]
    pub connect_timeout_seconds: u64,

    /// Default TTL for memoized query results.
    #[validate(range(min = 1, max = 86400))]
    pub default_ttl_seconds: u64,

    /// Shorter TTL for the dashboard-statistics namespace.
    #[validate(range(min = 1, max = 86400))]
    pub stats_ttl_seconds: u64,

    #[validate(range(min = 1))]
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExportSettings {
    /// Payloads at or above this size are gzip-compressed.
    #[validate(range(min = 1))]
    pub compression_threshold_bytes: usize,

    /// Safety ceiling on exported documents; 0 disables the ceiling.
    pub max_documents: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HistorySettings {
    #[validate(range(min = 1, max = 3650))]
    pub retention_days: i64,

    #[validate(range(min = 1, max = 1000))]
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelemetrySettings {
    #[validate(length(min = 1, max = 100))]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,

    /// Directory for the rolling file appender; stdout-only when unset.
    pub log_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            store: StoreSettings::default(),
            cache: CacheSettings::default(),
            export: ExportSettings::default(),
            history: HistorySettings::default(),
            telemetry: TelemetrySettings::default(),
            debug_errors: false,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index_pattern: "app-logs-*".to_string(),
            timeout_seconds: 30,
            scroll_batch_size: 1000,
            scroll_window_seconds: 120,
            max_per_page: 100,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            connect_timeout_seconds: 5,
            max_pool_size: 50,
            min_pool_size: 10,
            idle_timeout_seconds: 60,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            connect_timeout_seconds: 5,
            default_ttl_seconds: 300,
            stats_ttl_seconds: 60,
            max_capacity: 10_000,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            compression_threshold_bytes: 1024,
            max_documents: 0,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            retention_days: 90,
            recent_limit: 10,
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            log_dir: None,
        }
    }
}

impl Settings {
    /// Loads settings from defaults, an optional config file, and the
    /// environment, then validates bounds.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&Settings::default())
                .map_err(|e| AppError::Config(e.to_string()))?,
        );

        if let Some(path) = config_path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        let settings: Settings = builder
            .add_source(config::Environment::with_prefix("LOGBOARD").separator("__"))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        settings
            .validate()
            .map_err(|e| AppError::Config(format!("invalid configuration: {}", e)))?;

        Ok(settings)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_seconds)
    }

    pub fn default_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.default_ttl_seconds)
    }

    pub fn stats_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.stats_ttl_seconds)
    }
}
