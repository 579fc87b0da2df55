//! Task repository, client side.
//!
//! The store only ever reaches the backend through [`TaskRepository`]. The
//! HTTP implementation speaks the `/api/tasks` contract served by
//! [`crate::routes_tasks`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RepositoryError;
use crate::models::{Priority, Status, Task};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Full task list, in backend order.
    async fn list(&self) -> Result<Vec<Task>, RepositoryError>;

    /// Appends a task. The backend does not enforce id uniqueness.
    async fn create(&self, task: &Task) -> Result<(), RepositoryError>;

    /// Merges the supplied fields into the record with the same id.
    async fn update(&self, task: &Task) -> Result<(), RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    id: &'a str,
}

/// PUT body. Unlike [`Task`], cleared optionals go out as `null` so the
/// backend's shallow merge overwrites them instead of keeping the old value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    priority: Priority,
    status: Status,
    category: &'a str,
    tags: &'a [String],
    due_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assigned_to: Option<&'a str>,
    estimated_time: Option<u32>,
}

impl<'a> From<&'a Task> for UpdateBody<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: &task.id,
            title: &task.title,
            description: &task.description,
            priority: task.priority,
            status: task.status,
            category: &task.category,
            tags: &task.tags,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
            assigned_to: task.assigned_to.as_deref(),
            estimated_time: task.estimated_time,
        }
    }
}

/// [`TaskRepository`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskRepository {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTaskRepository {
    /// `api_base` is the API root, e.g. `http://127.0.0.1:3000/api`.
    pub fn new(api_base: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_base)
    }

    pub fn with_client(client: reqwest::Client, api_base: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/tasks", api_base.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn ensure_success(response: &reqwest::Response, message: &str) -> Result<(), RepositoryError> {
    if response.status().is_success() {
        Ok(())
    } else {
        tracing::debug!(status = %response.status(), "{message}");
        Err(RepositoryError::Failed(message.to_string()))
    }
}

#[async_trait]
impl TaskRepository for HttpTaskRepository {
    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        tracing::debug!(endpoint = %self.endpoint, "GET tasks");
        let response = self.client.get(&self.endpoint).send().await?;
        ensure_success(&response, "Failed to fetch tasks")?;
        Ok(response.json::<Vec<Task>>().await?)
    }

    async fn create(&self, task: &Task) -> Result<(), RepositoryError> {
        tracing::debug!(id = %task.id, "POST task");
        let response = self.client.post(&self.endpoint).json(task).send().await?;
        ensure_success(&response, "Failed to add task")
    }

    async fn update(&self, task: &Task) -> Result<(), RepositoryError> {
        tracing::debug!(id = %task.id, "PUT task");
        let response = self
            .client
            .put(&self.endpoint)
            .json(&UpdateBody::from(task))
            .send()
            .await?;
        ensure_success(&response, "Failed to update task")
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        tracing::debug!(id, "DELETE task");
        let response = self
            .client
            .delete(&self.endpoint)
            .json(&DeleteBody { id })
            .send()
            .await?;
        ensure_success(&response, "Failed to delete task")
    }
}
