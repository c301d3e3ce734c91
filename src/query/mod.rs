//! Structured query representation and the pure filter-to-query builder.

pub mod builder;

use crate::models::{SortField, SortOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields returned for search and export results. Everything else stays
/// behind in the index.
pub const RESULT_FIELDS: &[&str] = &[
    "timestamp",
    "level",
    "endpoint",
    "status_code",
    "response_time_ms",
    "message",
    "server",
    "user_id",
    "client_ip",
];

/// One boolean filter clause. All clauses in a query are AND-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Clause {
    /// Full-text match with optional fuzziness.
    Match {
        field: String,
        query: String,
        fuzzy: bool,
    },
    /// Exact value on a keyword or numeric field.
    Term { field: String, value: Value },
    /// Membership in a value set.
    Terms { field: String, values: Vec<Value> },
    /// Half-open or bounded numeric/date range.
    Range {
        field: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lt: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lte: Option<Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

/// Backend-agnostic search request: filters, ordering, result window and
/// field projection. Pure data, produced by [`builder::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub clauses: Vec<Clause>,
    pub sort: SortSpec,
    pub offset: u64,
    pub limit: u64,
    pub projection: Vec<String>,
}

impl StructuredQuery {
    /// A query matching everything, newest first.
    pub fn match_all() -> Self {
        Self {
            clauses: Vec::new(),
            sort: SortSpec {
                field: SortField::Timestamp,
                order: SortOrder::Desc,
            },
            offset: 0,
            limit: 50,
            projection: RESULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}
