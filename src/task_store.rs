//! Task store: the single source of truth for task data on the client.
//!
//! Every repository-backed operation follows the same shape:
//! - set `loading`, clear `error`
//! - issue the repository call
//! - on success, refetch the full list (which also refreshes the cache)
//! - on failure, record the message in `error` and clear `loading`
//!
//! Local task data never changes optimistically; it only changes through a
//! fetch or `set_tasks`, so a failed call has nothing to roll back.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;

use crate::cache::{LocalCache, TASKS_KEY};
use crate::error::StoreError;
use crate::history::{SharedHistory, UndoAction};
use crate::models::Task;
use crate::repository::TaskRepository;

/// Observable store state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "tasks.json",
            ExportFormat::Csv => "tasks.csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

pub struct TaskStore {
    state: Mutex<StoreState>,
    repository: Arc<dyn TaskRepository>,
    cache: Arc<dyn LocalCache>,
    history: SharedHistory,
}

impl TaskStore {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        cache: Arc<dyn LocalCache>,
        history: SharedHistory,
    ) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            repository,
            cache,
            history,
        }
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.lock().clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn find(&self, id: &str) -> Option<Task> {
        self.state.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Loads the full list and replaces `tasks` wholesale.
    ///
    /// On failure the previous tasks stay in place.
    pub async fn fetch_tasks(&self) -> Result<(), StoreError> {
        self.begin();
        match self.repository.list().await {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "tasks fetched");
                {
                    let mut state = self.state.lock();
                    state.tasks = tasks.clone();
                    state.loading = false;
                }
                self.mirror(&tasks);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Records a `create` action, then submits the task.
    ///
    /// The task must already carry its id and timestamps. If the backend
    /// rejects the write, the recorded action is withdrawn again. A failed
    /// refetch after an accepted write keeps it: the task exists.
    pub async fn add_task(&self, task: Task) -> Result<(), StoreError> {
        let action = UndoAction::Create { task: task.clone() };
        self.history.lock().push_action(action.clone());

        self.begin();
        if let Err(e) = self.repository.create(&task).await {
            self.history.lock().retract(&action);
            return Err(self.fail(e.into()));
        }
        self.resync().await
    }

    /// Full-record replace keyed by id. Records nothing.
    pub async fn update_task(&self, task: Task) -> Result<(), StoreError> {
        self.begin();
        if let Err(e) = self.repository.update(&task).await {
            return Err(self.fail(e.into()));
        }
        self.resync().await
    }

    /// Records a `delete` action with the pre-delete snapshot (when the task
    /// is known locally), then deletes.
    pub async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        if let Some(task) = self.find(id) {
            self.history.lock().push_action(UndoAction::Delete { task });
        }
        self.delete_untracked(id).await
    }

    /// Flips completion: not done becomes done, done becomes todo.
    pub async fn toggle_complete(&self, id: &str) -> Result<(), StoreError> {
        let task = self.find(id);
        if let Some(task) = &task {
            self.history.lock().push_action(UndoAction::Toggle {
                task: task.clone(),
                prev_status: task.status,
            });
        }

        self.begin();
        let Some(task) = task else {
            return Err(self.fail(StoreError::TaskNotFound(id.to_string())));
        };

        let updated = task.with_status(task.status.toggled(), Utc::now());
        self.update_task(updated).await?;
        self.finish();
        Ok(())
    }

    /// Synchronous replace, mirrored to the cache.
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.mirror(&tasks);
        self.state.lock().tasks = tasks;
    }

    /// Replaces `tasks` with the cached snapshot, if one parses.
    pub fn hydrate_from_cache(&self) -> bool {
        let Some(raw) = self.cache.get(TASKS_KEY) else {
            return false;
        };
        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "hydrated from cache");
                self.set_tasks(tasks);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable cache entry");
                false
            }
        }
    }

    /// Renders the current tasks in the given format.
    pub fn export_tasks(&self, format: ExportFormat) -> Result<String, StoreError> {
        let tasks = self.tasks();
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&tasks)?),
            ExportFormat::Csv => Ok(render_csv(&tasks)),
        }
    }

    /// Writes an export into `dir` under the format's file name.
    pub fn export_to_dir(&self, format: ExportFormat, dir: &Path) -> Result<PathBuf, StoreError> {
        let body = self.export_tasks(format)?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format.file_name());
        std::fs::write(&path, body)?;
        tracing::info!(path = %path.display(), %format, "tasks exported");
        Ok(path)
    }

    // Replay paths for undo/redo. They never touch the history.

    pub(crate) async fn create_untracked(&self, task: Task) -> Result<(), StoreError> {
        self.begin();
        if let Err(e) = self.repository.create(&task).await {
            return Err(self.fail(e.into()));
        }
        self.resync().await
    }

    pub(crate) async fn delete_untracked(&self, id: &str) -> Result<(), StoreError> {
        self.begin();
        if let Err(e) = self.repository.delete(id).await {
            return Err(self.fail(e.into()));
        }
        self.resync().await
    }

    async fn resync(&self) -> Result<(), StoreError> {
        self.fetch_tasks().await?;
        self.finish();
        Ok(())
    }

    fn begin(&self) {
        let mut state = self.state.lock();
        state.loading = true;
        state.error = None;
    }

    fn finish(&self) {
        self.state.lock().loading = false;
    }

    fn fail(&self, err: StoreError) -> StoreError {
        tracing::warn!(error = %err, "task store operation failed");
        let mut state = self.state.lock();
        state.error = Some(err.to_string());
        state.loading = false;
        err
    }

    fn mirror(&self, tasks: &[Task]) {
        match serde_json::to_string(tasks) {
            Ok(json) => self.cache.set(TASKS_KEY, &json),
            Err(e) => tracing::debug!(error = %e, "cache snapshot skipped"),
        }
    }
}

/// CSV rendering of a task list.
///
/// The header is the key set of the first task, in field order. Each row
/// lists its values in that same key order; arrays are joined with `;`,
/// absent values are empty, and every value is quoted. An empty list yields
/// a single blank header line.
pub fn render_csv(tasks: &[Task]) -> String {
    let rows: Vec<serde_json::Map<String, Value>> = tasks
        .iter()
        .filter_map(|t| match serde_json::to_value(t) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect();

    let keys: Vec<String> = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(keys.join(","));
    for row in &rows {
        let cells: Vec<String> = keys.iter().map(|k| quote(&cell_text(row.get(k)))).collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| cell_text(Some(item)))
            .collect::<Vec<_>>()
            .join(";"),
        Some(other) => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
