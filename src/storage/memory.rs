//! In-memory document store on concurrent maps.

use crate::error::{AppError, Result};
use crate::models::records::{FileRecord, SavedSearch, SearchHistoryRecord, UserAccount};
use crate::storage::DocumentStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryDocumentStore {
    files: DashMap<String, FileRecord>,
    history: DashMap<String, SearchHistoryRecord>,
    saved_searches: DashMap<String, SavedSearch>,
    users: DashMap<String, UserAccount>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert_file(&self, record: FileRecord) -> Result<()> {
        self.files.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>> {
        Ok(self.files.get(id).map(|r| r.clone()))
    }

    async fn list_files(&self, limit: usize) -> Result<Vec<FileRecord>> {
        let mut files: Vec<FileRecord> = self.files.iter().map(|r| r.clone()).collect();
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        files.truncate(limit);
        Ok(files)
    }

    async fn mark_file_indexed(&self, id: &str, lines_indexed: u64) -> Result<bool> {
        match self.files.get_mut(id) {
            Some(mut record) => {
                record.lines_indexed = lines_indexed;
                record.status = crate::models::records::FileStatus::Indexed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_file(&self, id: &str) -> Result<bool> {
        Ok(self.files.remove(id).is_some())
    }

    async fn insert_history(&self, record: SearchHistoryRecord) -> Result<()> {
        self.history.insert(record.id.clone(), record);
        Ok(())
    }

    async fn recent_history(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHistoryRecord>> {
        let mut records: Vec<SearchHistoryRecord> = self
            .history
            .iter()
            .filter(|r| user_id.map_or(true, |u| r.user_id == u))
            .map(|r| r.clone())
            .collect();
        records.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn purge_history_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let before = self.history.len();
        self.history.retain(|_, record| record.executed_at >= cutoff);
        Ok((before - self.history.len()) as u64)
    }

    async fn insert_saved_search(&self, record: SavedSearch) -> Result<()> {
        self.saved_searches.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_saved_search(&self, id: &str) -> Result<Option<SavedSearch>> {
        Ok(self.saved_searches.get(id).map(|r| r.clone()))
    }

    async fn list_saved_searches(&self, user_id: &str) -> Result<Vec<SavedSearch>> {
        let mut records: Vec<SavedSearch> = self
            .saved_searches
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete_saved_search(&self, id: &str) -> Result<bool> {
        Ok(self.saved_searches.remove(id).is_some())
    }

    async fn touch_saved_search(&self, id: &str) -> Result<bool> {
        match self.saved_searches.get_mut(id) {
            Some(mut record) => {
                record.last_used_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_user(&self, record: UserAccount) -> Result<()> {
        if self
            .users
            .iter()
            .any(|u| u.username == record.username)
        {
            return Err(AppError::validation(format!(
                "username already exists: {}",
                record.username
            )));
        }
        self.users.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserAccount>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
