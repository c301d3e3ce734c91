//! Result caching: key derivation, the cache-service seam, and the
//! memoization layer used by the orchestrator.

pub mod key;
pub mod result_cache;
pub mod store;

pub use key::derive_key;
pub use result_cache::{CacheStats, ResultCache};
pub use store::{CacheStore, MemoryCacheStore};
