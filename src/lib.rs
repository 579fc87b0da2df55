// Client side: task store, undo/redo history, dashboard controller
pub mod cache;      // Local cache (last known task list)
pub mod dashboard;  // Filters, sorting, selection, undo/redo replay, shortcuts
pub mod error;      // Error taxonomy
pub mod history;    // Undo/redo log
pub mod models;     // Task, Priority, Status
pub mod repository; // Task repository trait + HTTP implementation
pub mod task_store; // Task store + export
pub mod validation; // Task form drafts

// Server side: JSON-file backed REST endpoints
pub mod routes_tasks; // HTTP handlers for /api/tasks
pub mod schema;       // Wire schema of request bodies / stored records
pub mod store;        // Persistent storage (load/save db.json)

pub mod config;
