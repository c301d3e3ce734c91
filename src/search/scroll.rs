//! Scroll export engine: drains every match in batches and always releases
//! the cursor, whether the drain succeeds or not.

use crate::error::{AppError, Result};
use crate::models::LogDocument;
use crate::query::StructuredQuery;
use crate::search::backend::{ScrollBatch, SearchBackend};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ScrollExporter {
    backend: Arc<dyn SearchBackend>,
    timeout: Duration,
}

impl ScrollExporter {
    pub fn new(backend: Arc<dyn SearchBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Collects every document the query matches, `batch_size` at a time.
    ///
    /// Each backend call carries the configured deadline; a hung engine
    /// fails the export with `Timeout` instead of stalling it.
    /// `max_documents` is a safety ceiling (0 = unlimited); exceeding it
    /// aborts with `ResourceExhausted`. The cursor is cleared exactly once
    /// on every path after `scroll_start` succeeds, including error paths.
    pub async fn export_all(
        &self,
        query: &StructuredQuery,
        batch_size: usize,
        max_documents: u64,
    ) -> Result<Vec<LogDocument>> {
        let first = self
            .deadline("scroll_start", self.backend.scroll_start(query, batch_size))
            .await?;
        let cursor = first.cursor.clone();

        let result = self.drain(first, max_documents).await;

        if let Err(clear_error) = self
            .deadline("scroll_clear", self.backend.scroll_clear(&cursor))
            .await
        {
            warn!(%clear_error, "failed to release scroll cursor");
        }

        result
    }

    async fn drain(&self, first: ScrollBatch, max_documents: u64) -> Result<Vec<LogDocument>> {
        let cursor = first.cursor.clone();
        let total = first.total;
        let mut collected = first.hits;

        loop {
            if max_documents > 0 && collected.len() as u64 > max_documents {
                return Err(AppError::resource_exhausted(format!(
                    "export of {} documents exceeds the configured ceiling of {}",
                    total, max_documents
                )));
            }
            let batch = self
                .deadline("scroll_next", self.backend.scroll_next(&cursor))
                .await?;
            if batch.hits.is_empty() {
                break;
            }
            collected.extend(batch.hits);
        }

        debug!(collected = collected.len(), total, "scroll export complete");
        Ok(collected)
    }

    async fn deadline<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AppError::timeout(operation, self.timeout.as_secs())),
        }
    }
}
