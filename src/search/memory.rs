//! In-memory search backend for tests and single-node development.

use crate::error::{AppError, Result};
use crate::models::{LogDocument, SortField, SortOrder};
use crate::query::{Clause, StructuredQuery};
use crate::search::backend::{
    AggregationRequest, AggregationResult, CursorId, ScrollBatch, SearchBackend, SearchHits,
    TermBucket,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use uuid::Uuid;

struct CursorState {
    remaining: Vec<LogDocument>,
    batch: usize,
    total: u64,
}

#[derive(Default)]
pub struct MemoryBackend {
    docs: RwLock<Vec<LogDocument>>,
    cursors: DashMap<String, CursorState>,
    released: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self, docs: impl IntoIterator<Item = LogDocument>) {
        self.docs.write().extend(docs);
    }

    /// Simulates an unreachable engine: every call fails until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Cursors cleared so far. Test observability.
    pub fn released_cursors(&self) -> u64 {
        self.released.load(AtomicOrdering::SeqCst)
    }

    /// Cursors currently held open. Test observability.
    pub fn open_cursors(&self) -> usize {
        self.cursors.len()
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            Err(AppError::search_backend(operation, "backend unavailable"))
        } else {
            Ok(())
        }
    }

    fn matching_sorted(&self, clauses: &[Clause], field: SortField, order: SortOrder) -> Vec<LogDocument> {
        let mut matched: Vec<LogDocument> = self
            .docs
            .read()
            .iter()
            .filter(|doc| clauses.iter().all(|clause| matches_clause(doc, clause)))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = compare_docs(a, b, field);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        matched
    }
}

fn field_value(doc: &LogDocument, field: &str) -> Option<Value> {
    match field {
        "timestamp" => Some(Value::String(doc.timestamp.to_rfc3339())),
        "level" => Some(Value::String(doc.level.clone())),
        "endpoint" => doc.endpoint.clone().map(Value::String),
        "status_code" => doc.status_code.map(|c| json!(c)),
        "response_time_ms" => doc.response_time_ms.map(|v| json!(v)),
        "message" => Some(Value::String(doc.message.clone())),
        "server" => doc.server.clone().map(Value::String),
        "user_id" => doc.user_id.clone().map(Value::String),
        "client_ip" => doc.client_ip.clone().map(Value::String),
        _ => None,
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn value_cmp(actual: &Value, bound: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (actual.as_f64(), bound.as_f64()) {
        return a.partial_cmp(&b);
    }
    match (actual.as_str(), bound.as_str()) {
        (Some(a), Some(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn matches_clause(doc: &LogDocument, clause: &Clause) -> bool {
    match clause {
        Clause::Match { field, query, .. } => {
            let Some(Value::String(text)) = field_value(doc, field) else {
                return false;
            };
            let haystack = text.to_lowercase();
            query
                .split_whitespace()
                .all(|token| haystack.contains(&token.to_lowercase()))
        }
        Clause::Term { field, value } => field_value(doc, field)
            .map(|actual| values_equal(&actual, value))
            .unwrap_or(false),
        Clause::Terms { field, values } => field_value(doc, field)
            .map(|actual| values.iter().any(|v| values_equal(&actual, v)))
            .unwrap_or(false),
        Clause::Range {
            field,
            gte,
            lt,
            lte,
        } => {
            let Some(actual) = field_value(doc, field) else {
                return false;
            };
            if let Some(bound) = gte {
                if !matches!(
                    value_cmp(&actual, bound),
                    Some(Ordering::Greater | Ordering::Equal)
                ) {
                    return false;
                }
            }
            if let Some(bound) = lt {
                if !matches!(value_cmp(&actual, bound), Some(Ordering::Less)) {
                    return false;
                }
            }
            if let Some(bound) = lte {
                if !matches!(
                    value_cmp(&actual, bound),
                    Some(Ordering::Less | Ordering::Equal)
                ) {
                    return false;
                }
            }
            true
        }
    }
}

fn compare_docs(a: &LogDocument, b: &LogDocument, field: SortField) -> Ordering {
    match field {
        SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
        SortField::Level => a.level.cmp(&b.level),
        SortField::StatusCode => a.status_code.cmp(&b.status_code),
        SortField::ResponseTime => a
            .response_time_ms
            .partial_cmp(&b.response_time_ms)
            .unwrap_or(Ordering::Equal),
        SortField::Endpoint => a.endpoint.cmp(&b.endpoint),
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn search(&self, query: &StructuredQuery) -> Result<SearchHits> {
        self.check_available("search")?;
        let matched = self.matching_sorted(&query.clauses, query.sort.field, query.sort.order);
        let total = matched.len() as u64;
        let hits = matched
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok(SearchHits { hits, total })
    }

    async fn count(&self, clauses: &[Clause]) -> Result<u64> {
        self.check_available("count")?;
        let count = self
            .docs
            .read()
            .iter()
            .filter(|doc| clauses.iter().all(|clause| matches_clause(doc, clause)))
            .count();
        Ok(count as u64)
    }

    async fn aggregate(
        &self,
        clauses: &[Clause],
        request: &AggregationRequest,
    ) -> Result<AggregationResult> {
        self.check_available("aggregate")?;
        let matched = self.matching_sorted(clauses, SortField::Timestamp, SortOrder::Desc);

        match request {
            AggregationRequest::Average { field } => {
                let values: Vec<f64> = matched
                    .iter()
                    .filter_map(|doc| field_value(doc, field)?.as_f64())
                    .collect();
                if values.is_empty() {
                    Ok(AggregationResult::Average(None))
                } else {
                    let avg = values.iter().sum::<f64>() / values.len() as f64;
                    Ok(AggregationResult::Average(Some(avg)))
                }
            }
            AggregationRequest::TermsByAverage {
                field,
                avg_field,
                size,
            } => {
                let mut groups: HashMap<String, (f64, u64)> = HashMap::new();
                for doc in &matched {
                    let Some(Value::String(key)) = field_value(doc, field) else {
                        continue;
                    };
                    let Some(value) = field_value(doc, avg_field).and_then(|v| v.as_f64())
                    else {
                        continue;
                    };
                    let entry = groups.entry(key).or_insert((0.0, 0));
                    entry.0 += value;
                    entry.1 += 1;
                }

                let mut buckets: Vec<TermBucket> = groups
                    .into_iter()
                    .map(|(key, (sum, count))| TermBucket {
                        key,
                        average: sum / count as f64,
                        count,
                    })
                    .collect();
                buckets.sort_by(|a, b| {
                    b.average
                        .partial_cmp(&a.average)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.key.cmp(&b.key))
                });
                buckets.truncate(*size);
                Ok(AggregationResult::Buckets(buckets))
            }
            AggregationRequest::Cardinality { field } => {
                let distinct: HashSet<String> = matched
                    .iter()
                    .filter_map(|doc| match field_value(doc, field) {
                        Some(Value::String(s)) => Some(s),
                        Some(other) => Some(other.to_string()),
                        None => None,
                    })
                    .collect();
                Ok(AggregationResult::Cardinality(distinct.len() as u64))
            }
        }
    }

    async fn scroll_start(
        &self,
        query: &StructuredQuery,
        batch_size: usize,
    ) -> Result<ScrollBatch> {
        self.check_available("scroll_start")?;
        let mut matched =
            self.matching_sorted(&query.clauses, query.sort.field, query.sort.order);
        let total = matched.len() as u64;

        let first: Vec<LogDocument> = matched
            .drain(..batch_size.min(matched.len()))
            .collect();

        let id = Uuid::new_v4().to_string();
        self.cursors.insert(
            id.clone(),
            CursorState {
                remaining: matched,
                batch: batch_size,
                total,
            },
        );

        Ok(ScrollBatch {
            cursor: CursorId(id),
            hits: first,
            total,
        })
    }

    async fn scroll_next(&self, cursor: &CursorId) -> Result<ScrollBatch> {
        self.check_available("scroll_next")?;
        let mut state = self
            .cursors
            .get_mut(&cursor.0)
            .ok_or_else(|| AppError::search_backend("scroll_next", "unknown cursor"))?;

        let take = state.batch.min(state.remaining.len());
        let hits: Vec<LogDocument> = state.remaining.drain(..take).collect();
        Ok(ScrollBatch {
            cursor: cursor.clone(),
            hits,
            total: state.total,
        })
    }

    async fn scroll_clear(&self, cursor: &CursorId) -> Result<()> {
        self.check_available("scroll_clear")?;
        if self.cursors.remove(&cursor.0).is_some() {
            self.released.fetch_add(1, AtomicOrdering::SeqCst);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.check_available("ping")
    }
}
