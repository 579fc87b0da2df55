//! Wire schema of the `/api/tasks` backend.
//!
//! Request bodies are checked against these types by the `Json` extractor,
//! which is the only validation the backend does. They are kept
//! separate from the client's [`crate::models::Task`].

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Priority, Status};

/// A task as stored in the database file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub due_date: DateTime<FixedOffset>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
}

/// PUT body: an id plus any subset of fields to overwrite.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<DateTime<FixedOffset>>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    /// `None` when absent, `Some(None)` for an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub estimated_time: Option<Option<u32>>,
}

// Only called when the key is present, so a `null` value becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    /// Shallow merge: every supplied field replaces the stored one.
    pub fn apply(self, record: &mut TaskRecord) {
        if let Some(v) = self.title {
            record.title = v;
        }
        if let Some(v) = self.description {
            record.description = v;
        }
        if let Some(v) = self.priority {
            record.priority = v;
        }
        if let Some(v) = self.status {
            record.status = v;
        }
        if let Some(v) = self.category {
            record.category = v;
        }
        if let Some(v) = self.tags {
            record.tags = v;
        }
        if let Some(v) = self.due_date {
            record.due_date = v;
        }
        if let Some(v) = self.created_at {
            record.created_at = v;
        }
        if let Some(v) = self.updated_at {
            record.updated_at = v;
        }
        if let Some(v) = self.assigned_to {
            record.assigned_to = v;
        }
        if let Some(v) = self.estimated_time {
            record.estimated_time = v;
        }
    }
}

/// DELETE body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: String,
}
