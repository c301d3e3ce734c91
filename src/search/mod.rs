//! Search-engine seam, query execution, and the scroll export engine.

pub mod backend;
pub mod executor;
pub mod memory;
pub mod scroll;

pub use backend::{
    AggregationRequest, AggregationResult, CursorId, ScrollBatch, SearchBackend, SearchHits,
    TermBucket,
};
pub use executor::{ExecutedSearch, QueryExecutor};
pub use memory::MemoryBackend;
pub use scroll::ScrollExporter;
