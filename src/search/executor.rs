//! Timeout-bounded query execution with latency recording.

use crate::error::{AppError, Result};
use crate::metrics::{PerformanceMonitor, GROUP_SEARCH};
use crate::query::{Clause, StructuredQuery};
use crate::search::backend::{
    AggregationRequest, AggregationResult, SearchBackend, SearchHits,
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// A completed search with its observed latency.
#[derive(Debug, Clone)]
pub struct ExecutedSearch {
    pub hits: SearchHits,
    pub elapsed_ms: f64,
}

/// Wraps every backend call in a deadline, records its latency under
/// `search:{operation}`, and normalizes failures into the typed taxonomy.
pub struct QueryExecutor {
    backend: Arc<dyn SearchBackend>,
    metrics: Arc<PerformanceMonitor>,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        metrics: Arc<PerformanceMonitor>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            metrics,
            timeout,
        }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    pub async fn execute(&self, operation: &str, query: &StructuredQuery) -> Result<ExecutedSearch> {
        let (hits, elapsed_ms) = self
            .timed(operation, self.backend.search(query))
            .await?;
        debug!(operation, total = hits.total, elapsed_ms, "search executed");
        Ok(ExecutedSearch { hits, elapsed_ms })
    }

    pub async fn count(&self, operation: &str, clauses: &[Clause]) -> Result<u64> {
        let (count, _) = self.timed(operation, self.backend.count(clauses)).await?;
        Ok(count)
    }

    pub async fn aggregate(
        &self,
        operation: &str,
        clauses: &[Clause],
        request: &AggregationRequest,
    ) -> Result<AggregationResult> {
        let (result, _) = self
            .timed(operation, self.backend.aggregate(clauses, request))
            .await?;
        Ok(result)
    }

    async fn timed<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<(T, f64)> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, call).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics
            .record(&format!("{}:{}", GROUP_SEARCH, operation), elapsed_ms);

        match outcome {
            Ok(Ok(value)) => Ok((value, elapsed_ms)),
            Ok(Err(err)) => {
                error!(operation, %err, "search backend call failed");
                Err(err)
            }
            Err(_) => {
                error!(operation, timeout_s = self.timeout.as_secs(), "search backend call timed out");
                Err(AppError::timeout(operation, self.timeout.as_secs()))
            }
        }
    }
}
