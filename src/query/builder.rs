//! Pure translation from [`FilterParams`] to a [`StructuredQuery`].
//!
//! No I/O and no clock access: equal filters always produce equal queries,
//! which is what makes derived cache keys stable.

use crate::models::{FilterParams, StatusCodeFilter};
use crate::query::{Clause, SortSpec, StructuredQuery, RESULT_FIELDS};
use serde_json::{json, Value};

/// Builds the structured query for a validated filter set.
///
/// Every active filter contributes exactly one AND-combined clause. An
/// unparseable status filter contributes nothing, matching the permissive
/// behavior of the dashboard UI.
pub fn build(params: &FilterParams) -> StructuredQuery {
    let mut clauses = Vec::new();

    if let Some(text) = non_empty(&params.text_query) {
        clauses.push(Clause::Match {
            field: "message".to_string(),
            query: text.to_string(),
            fuzzy: true,
        });
    }

    if let Some(level) = &params.level {
        clauses.push(Clause::Term {
            field: "level".to_string(),
            value: Value::String(level.to_string()),
        });
    }

    if let Some(endpoint) = non_empty(&params.endpoint) {
        clauses.push(Clause::Term {
            field: "endpoint".to_string(),
            value: Value::String(endpoint.to_string()),
        });
    }

    if let Some(raw) = &params.status_code {
        match StatusCodeFilter::parse(raw) {
            Some(StatusCodeFilter::Class(base)) => clauses.push(Clause::Range {
                field: "status_code".to_string(),
                gte: Some(json!(base)),
                lt: Some(json!(base + 100)),
                lte: None,
            }),
            Some(StatusCodeFilter::Exact(code)) => clauses.push(Clause::Term {
                field: "status_code".to_string(),
                value: json!(code),
            }),
            None => {}
        }
    }

    if let Some(server) = non_empty(&params.server) {
        clauses.push(Clause::Term {
            field: "server".to_string(),
            value: Value::String(server.to_string()),
        });
    }

    if params.date_from.is_some() || params.date_to.is_some() {
        clauses.push(Clause::Range {
            field: "timestamp".to_string(),
            gte: params.date_from.map(|d| Value::String(d.to_rfc3339())),
            lt: None,
            lte: params.date_to.map(|d| Value::String(d.to_rfc3339())),
        });
    }

    StructuredQuery {
        clauses,
        sort: SortSpec {
            field: params.sort_field,
            order: params.sort_order,
        },
        offset: (params.page.saturating_sub(1) as u64) * params.per_page as u64,
        limit: params.per_page as u64,
        projection: RESULT_FIELDS.iter().map(|f| f.to_string()).collect(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
