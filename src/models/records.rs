//! Persisted records held in the document store: uploaded files, search
//! history, saved searches, user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for an uploaded log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub filename: String,
    pub size_bytes: u64,
    pub lines_indexed: u64,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Processing,
    Indexed,
    Failed,
}

impl FileRecord {
    pub fn new(filename: impl Into<String>, size_bytes: u64, uploaded_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename: filename.into(),
            size_bytes,
            lines_indexed: 0,
            uploaded_by: uploaded_by.into(),
            uploaded_at: Utc::now(),
            status: FileStatus::Processing,
        }
    }
}

/// One executed search, kept for the recent-searches panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryRecord {
    pub id: String,
    pub user_id: String,
    pub query: String,
    /// Only the filters that were actually set.
    pub filters: serde_json::Map<String, serde_json::Value>,
    pub results_count: u64,
    pub executed_at: DateTime<Utc>,
}

impl SearchHistoryRecord {
    pub fn new(
        user_id: impl Into<String>,
        query: impl Into<String>,
        filters: serde_json::Map<String, serde_json::Value>,
        results_count: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            query: query.into(),
            filters,
            results_count,
            executed_at: Utc::now(),
        }
    }
}

/// A named filter set a user can re-run later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub filters: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl SavedSearch {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        filters: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            filters,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }
}

/// Account record. Authentication itself lives at the HTTP boundary; this
/// crate only stores and looks up accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    Viewer,
}

impl UserAccount {
    pub fn new(username: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            role,
            created_at: Utc::now(),
        }
    }
}
