//! Task form input and its validation.
//!
//! A [`TaskDraft`] is what the add/edit form collects: every field as the
//! user typed it. Validation turns it into a [`Task`], assigning a fresh id
//! and timestamps for new tasks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Priority, Status, Task};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub category: String,
    /// Comma separated.
    pub tags: String,
    /// `YYYY-MM-DD` or RFC 3339.
    pub due_date: String,
    pub assigned_to: Option<String>,
    /// Minutes, as typed.
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.joined())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &str) {
        self.errors.push(FieldError {
            field,
            message: message.to_string(),
        });
    }

    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// All messages, `; `-separated.
    pub fn joined(&self) -> String {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        messages.join("; ")
    }
}

// Fields that survive validation, before identity is attached.
struct Checked {
    title: String,
    description: String,
    category: String,
    tags: Vec<String>,
    due_date: DateTime<Utc>,
    assigned_to: Option<String>,
    estimated_time: Option<u32>,
}

impl TaskDraft {
    /// Prefills a draft from an existing task, for editing.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            category: task.category.clone(),
            tags: task.tags.join(", "),
            due_date: task.due_date.to_rfc3339(),
            assigned_to: task.assigned_to.clone(),
            estimated_time: task.estimated_time.map(|m| m.to_string()),
        }
    }

    /// Builds a brand-new task with a fresh id and `created_at = updated_at = now`.
    pub fn into_new_task(self, now: DateTime<Utc>) -> Result<Task, ValidationErrors> {
        let (priority, status) = (self.priority, self.status);
        let c = self.check()?;
        Ok(Task {
            id: Uuid::new_v4().to_string(),
            title: c.title,
            description: c.description,
            priority,
            status,
            category: c.category,
            tags: c.tags,
            due_date: c.due_date,
            created_at: now,
            updated_at: now,
            assigned_to: c.assigned_to,
            estimated_time: c.estimated_time,
        })
    }

    /// Applies the draft on top of `existing`, keeping its id and `created_at`.
    pub fn apply_to(self, existing: &Task, now: DateTime<Utc>) -> Result<Task, ValidationErrors> {
        let (priority, status) = (self.priority, self.status);
        let c = self.check()?;
        Ok(Task {
            id: existing.id.clone(),
            title: c.title,
            description: c.description,
            priority,
            status,
            category: c.category,
            tags: c.tags,
            due_date: c.due_date,
            created_at: existing.created_at,
            updated_at: now,
            assigned_to: c.assigned_to,
            estimated_time: c.estimated_time,
        })
    }

    fn check(self) -> Result<Checked, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.push("title", "Title is required");
        }
        let description = self.description.trim().to_string();
        if description.is_empty() {
            errors.push("description", "Description is required");
        }
        let category = self.category.trim().to_string();
        if category.is_empty() {
            errors.push("category", "Category is required");
        }

        let due_date = if self.due_date.trim().is_empty() {
            errors.push("dueDate", "Due date is required");
            None
        } else {
            let parsed = parse_due_date(&self.due_date);
            if parsed.is_none() {
                errors.push("dueDate", "Due date is invalid");
            }
            parsed
        };

        let estimated_time = match self.estimated_time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(minutes) => Some(minutes),
                Err(_) => {
                    errors.push(
                        "estimatedTime",
                        "Estimated time must be a non-negative number of whole minutes",
                    );
                    None
                }
            },
        };

        let assigned_to = self
            .assigned_to
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        match due_date {
            Some(due_date) if errors.errors.is_empty() => Ok(Checked {
                title,
                description,
                category,
                tags: split_tags(&self.tags),
                due_date,
                assigned_to,
                estimated_time,
            }),
            _ => Err(errors),
        }
    }
}

/// Splits comma-separated tags, trimming and dropping empties.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> TaskDraft {
        TaskDraft {
            title: " Plan sprint ".to_string(),
            description: "Backlog grooming".to_string(),
            priority: Priority::High,
            status: Status::Todo,
            category: "work".to_string(),
            tags: "planning, , team ,".to_string(),
            due_date: "2024-06-10".to_string(),
            assigned_to: Some("  ".to_string()),
            estimated_time: Some("45".to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn new_task_gets_identity_and_timestamps() {
        let task = draft().into_new_task(now()).unwrap();
        assert!(Uuid::parse_str(&task.id).is_ok());
        assert_eq!(task.title, "Plan sprint");
        assert_eq!(task.tags, vec!["planning", "team"]);
        assert_eq!(task.created_at, now());
        assert_eq!(task.updated_at, now());
        assert_eq!(task.due_date, Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
        assert_eq!(task.assigned_to, None);
        assert_eq!(task.estimated_time, Some(45));
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = draft().into_new_task(now()).unwrap();
        let b = draft().into_new_task(now()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn edit_keeps_identity_and_creation_time() {
        let original = draft().into_new_task(now()).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        let mut edit = TaskDraft::from_task(&original);
        edit.status = Status::InProgress;

        let edited = edit.apply_to(&original, later).unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(edited.updated_at, later);
        assert_eq!(edited.status, Status::InProgress);
        assert_eq!(edited.tags, original.tags);
        assert_eq!(edited.due_date, original.due_date);
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = TaskDraft::default().into_new_task(now()).unwrap_err();
        assert_eq!(errors.for_field("title"), Some("Title is required"));
        assert_eq!(errors.for_field("description"), Some("Description is required"));
        assert_eq!(errors.for_field("category"), Some("Category is required"));
        assert_eq!(errors.for_field("dueDate"), Some("Due date is required"));
    }

    #[test]
    fn rejects_negative_estimates_and_bad_dates() {
        let mut d = draft();
        d.estimated_time = Some("-5".to_string());
        d.due_date = "next tuesday".to_string();
        let errors = d.into_new_task(now()).unwrap_err();
        assert!(errors.for_field("estimatedTime").is_some());
        assert_eq!(errors.for_field("dueDate"), Some("Due date is invalid"));
        assert!(errors.to_string().contains("; "));
    }

    #[test]
    fn estimates_are_whole_minutes() {
        let mut d = draft();
        d.estimated_time = Some("1.5".to_string());
        let errors = d.into_new_task(now()).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "Estimated time must be a non-negative number of whole minutes"
        );

        let mut d = draft();
        d.estimated_time = Some(" 0 ".to_string());
        assert_eq!(d.into_new_task(now()).unwrap().estimated_time, Some(0));
    }
}
