//! Log-monitoring dashboard core.
//!
//! Turns validated search filters into structured queries, memoizes query
//! results with namespace-scoped invalidation, executes searches against a
//! pluggable backend with deadlines and latency accounting, and streams
//! unbounded CSV exports through scroll cursors. The HTTP router, search
//! engine, cache service and document store are external collaborators
//! behind the seams in [`search`], [`cache`] and [`storage`].

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod query;
pub mod search;
pub mod storage;
pub mod telemetry;

pub use config::Settings;
pub use error::{AppError, ErrorEnvelope, Result};
pub use models::{FilterParams, LogDocument, SearchPage};
pub use orchestrator::{AppContext, SearchOrchestrator};
