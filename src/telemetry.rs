//! Tracing initialization: env-filtered fmt/JSON output with an optional
//! rolling file appender.

use crate::config::TelemetrySettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. The returned guard must be held for the
/// process lifetime when file logging is enabled, or buffered lines are lost.
///
/// Repeated initialization (e.g. across tests) is a no-op.
pub fn init(settings: &TelemetrySettings) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    if let Some(dir) = &settings.log_dir {
        let appender = tracing_appender::rolling::daily(dir, "logboard.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        if settings.json_logs {
            let _ = registry
                .with(fmt::layer().json().with_writer(writer))
                .try_init();
        } else {
            let _ = registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init();
        }
        Some(guard)
    } else {
        if settings.json_logs {
            let _ = registry.with(fmt::layer().json()).try_init();
        } else {
            let _ = registry.with(fmt::layer()).try_init();
        }
        None
    }
}
