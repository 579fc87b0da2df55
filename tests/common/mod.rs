#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use task_dashboard::cache::{LocalCache, MemoryCache};
use task_dashboard::error::RepositoryError;
use task_dashboard::history::{SharedHistory, UndoRedoLog};
use task_dashboard::models::{Priority, Status, Task};
use task_dashboard::repository::TaskRepository;
use task_dashboard::routes_tasks;
use task_dashboard::store::JsonFileDb;
use task_dashboard::task_store::TaskStore;

pub fn task(id: &str, title: &str, status: Status) -> Task {
    let t = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{title} details"),
        priority: Priority::Medium,
        status,
        category: "work".to_string(),
        tags: vec!["x".to_string(), "y".to_string()],
        due_date: t,
        created_at: t,
        updated_at: t,
        assigned_to: Some("Alice".to_string()),
        estimated_time: Some(30),
    }
}

/// In-memory [`TaskRepository`] with switchable failures and scripted
/// delays on `list`.
#[derive(Default)]
pub struct MemoryRepository {
    tasks: Mutex<Vec<Task>>,
    fail: AtomicBool,
    fail_list: AtomicBool,
    list_delays: Mutex<VecDeque<Duration>>,
}

impl MemoryRepository {
    pub fn with_tasks(tasks: Vec<Task>) -> Arc<Self> {
        Arc::new(Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        })
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Fails `list` only; writes still succeed.
    pub fn set_list_failing(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Each `list` call takes its snapshot immediately, then waits for the
    /// next queued delay before answering.
    pub fn queue_list_delays(&self, delays: &[Duration]) {
        self.list_delays.lock().extend(delays.iter().copied());
    }

    pub fn stored(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    fn check(&self, message: &str) -> Result<(), RepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(RepositoryError::Failed(message.to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TaskRepository for MemoryRepository {
    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        self.check("Failed to fetch tasks")?;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RepositoryError::Failed("Failed to fetch tasks".to_string()));
        }
        let snapshot = self.tasks.lock().clone();
        let delay = self.list_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn create(&self, task: &Task) -> Result<(), RepositoryError> {
        self.check("Failed to add task")?;
        self.tasks.lock().push(task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<(), RepositoryError> {
        self.check("Failed to update task")?;
        let mut tasks = self.tasks.lock();
        if let Some(t) = tasks.iter_mut().find(|t| t.id == task.id) {
            *t = task.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.check("Failed to delete task")?;
        self.tasks.lock().retain(|t| t.id != id);
        Ok(())
    }
}

pub struct Harness {
    pub repo: Arc<MemoryRepository>,
    pub cache: Arc<MemoryCache>,
    pub history: SharedHistory,
    pub store: TaskStore,
}

pub fn harness(tasks: Vec<Task>) -> Harness {
    let repo = MemoryRepository::with_tasks(tasks);
    let cache = Arc::new(MemoryCache::new());
    let history = UndoRedoLog::shared();
    let store = TaskStore::new(
        repo.clone() as Arc<dyn TaskRepository>,
        cache.clone() as Arc<dyn LocalCache>,
        history.clone(),
    );
    Harness {
        repo,
        cache,
        history,
        store,
    }
}

/// Starts the backend in-process on an OS-assigned port and returns the API base URL.
pub async fn start_backend(dir: &Path) -> String {
    let db = JsonFileDb::new(dir.join("db.json"));
    let app = routes_tasks::app(db, None);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test backend");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test backend failed");
    });
    format!("http://{addr}/api")
}
