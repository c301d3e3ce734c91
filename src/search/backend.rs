//! Search-engine contract.
//!
//! The engine is an external collaborator; this trait is the only surface
//! the rest of the crate sees. The in-memory implementation in
//! [`crate::search::memory`] backs tests and local development.

use crate::error::Result;
use crate::models::LogDocument;
use crate::query::{Clause, StructuredQuery};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page of hits plus the total match count across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    pub hits: Vec<LogDocument>,
    pub total: u64,
}

/// Opaque scroll-cursor handle. Holding one ties up resources on the engine
/// until it is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CursorId(pub String);

#[derive(Debug, Clone)]
pub struct ScrollBatch {
    pub cursor: CursorId,
    pub hits: Vec<LogDocument>,
    /// Total match count for the whole scroll, reported on every batch.
    pub total: u64,
}

/// Aggregations used by the dashboard statistics endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationRequest {
    /// Mean of a numeric field over matching documents.
    Average { field: String },
    /// Buckets by `field`, each carrying the average of `avg_field`, the
    /// top `size` buckets by that average first.
    TermsByAverage {
        field: String,
        avg_field: String,
        size: usize,
    },
    /// Distinct-value count of a field.
    Cardinality { field: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermBucket {
    pub key: String,
    pub average: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationResult {
    Average(Option<f64>),
    Buckets(Vec<TermBucket>),
    Cardinality(u64),
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs a paged search honoring sort, offset, limit and projection.
    async fn search(&self, query: &StructuredQuery) -> Result<SearchHits>;

    /// Counts documents matching the clauses.
    async fn count(&self, clauses: &[Clause]) -> Result<u64>;

    async fn aggregate(
        &self,
        clauses: &[Clause],
        request: &AggregationRequest,
    ) -> Result<AggregationResult>;

    /// Opens a scroll over every document the query matches (offset and
    /// limit are ignored) and returns the first batch.
    async fn scroll_start(&self, query: &StructuredQuery, batch_size: usize)
        -> Result<ScrollBatch>;

    async fn scroll_next(&self, cursor: &CursorId) -> Result<ScrollBatch>;

    /// Releases a cursor. Safe to call on an already released cursor.
    async fn scroll_clear(&self, cursor: &CursorId) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}
