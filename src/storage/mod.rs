//! Document-store seam over the four persisted collections.

pub mod memory;

pub use memory::MemoryDocumentStore;

use crate::error::Result;
use crate::models::records::{FileRecord, SavedSearch, SearchHistoryRecord, UserAccount};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// External document-store contract (files, search history, saved searches,
/// users). A production deployment implements this against its database;
/// the in-memory implementation backs tests and local development.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_file(&self, record: FileRecord) -> Result<()>;

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>>;

    /// Newest first.
    async fn list_files(&self, limit: usize) -> Result<Vec<FileRecord>>;

    /// Marks an upload fully indexed with its final line count.
    async fn mark_file_indexed(&self, id: &str, lines_indexed: u64) -> Result<bool>;

    /// Returns whether a record was actually removed.
    async fn delete_file(&self, id: &str) -> Result<bool>;

    async fn insert_history(&self, record: SearchHistoryRecord) -> Result<()>;

    /// Newest first, optionally scoped to one user.
    async fn recent_history(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHistoryRecord>>;

    /// Retention sweep. Returns how many records were removed.
    async fn purge_history_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn insert_saved_search(&self, record: SavedSearch) -> Result<()>;

    async fn get_saved_search(&self, id: &str) -> Result<Option<SavedSearch>>;

    async fn list_saved_searches(&self, user_id: &str) -> Result<Vec<SavedSearch>>;

    async fn delete_saved_search(&self, id: &str) -> Result<bool>;

    /// Stamps `last_used_at` when a saved search is re-run.
    async fn touch_saved_search(&self, id: &str) -> Result<bool>;

    async fn insert_user(&self, record: UserAccount) -> Result<()>;

    async fn find_user(&self, username: &str) -> Result<Option<UserAccount>>;

    async fn ping(&self) -> Result<()>;
}
