// --------------------------------------------------
// Handles the task repository endpoints.
//
// Responsibilities:
// - List / create / update / delete tasks in the JSON file
// - Answer every failure with { "error": "<message>" }
//
// Each write re-reads and re-writes the whole file; there
// is no locking, so concurrent writers race (last one wins).
// -------------------------------------------------

use std::path::Path;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::services::ServeDir;

use crate::schema::{DeleteRequest, TaskPatch, TaskRecord};
use crate::store::JsonFileDb;

/// `/tasks` routes, to be nested under `/api`.
pub fn router(db: JsonFileDb) -> Router {
    Router::new()
        .route(
            "/tasks",
            get(get_tasks)
                .post(create_task)
                .put(update_task)
                .delete(delete_task),
        )
        .with_state(db)
}

/// Full application: the API under `/api`, plus static files when a
/// directory is given.
pub fn app(db: JsonFileDb, static_dir: Option<&Path>) -> Router {
    let app = Router::new().nest("/api", router(db));
    match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    }
}

fn fail(status: StatusCode, message: impl std::fmt::Display) -> Response {
    let message = message.to_string();
    tracing::error!(%status, error = %message, "task request failed");
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn ok() -> Response {
    Json(serde_json::json!({ "success": true })).into_response()
}

// -----------------------------
// GET /api/tasks
// Returns the full task array
// -----------------------------
pub async fn get_tasks(State(db): State<JsonFileDb>) -> impl IntoResponse {
    match db.load() {
        Ok(data) => Json(data.tasks).into_response(),
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

// -----------------------------
// POST /api/tasks
// Appends one task as given (no id uniqueness check)
// -----------------------------
pub async fn create_task(
    State(db): State<JsonFileDb>,
    Json(task): Json<TaskRecord>,
) -> impl IntoResponse {
    let mut data = match db.load() {
        Ok(data) => data,
        Err(e) => return fail(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    tracing::info!(id = %task.id, "creating task");
    data.tasks.push(task);

    if let Err(e) = db.save(&data) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, e);
    }
    ok()
}

// -----------------------------
// PUT /api/tasks
// Shallow-merges the body into the record with the same id
// -----------------------------
pub async fn update_task(
    State(db): State<JsonFileDb>,
    Json(patch): Json<TaskPatch>,
) -> impl IntoResponse {
    let mut data = match db.load() {
        Ok(data) => data,
        Err(e) => return fail(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    // An unknown id matches nothing and still succeeds.
    if let Some(t) = data.tasks.iter_mut().find(|t| t.id == patch.id) {
        tracing::info!(id = %patch.id, "updating task");
        patch.apply(t);
    }

    if let Err(e) = db.save(&data) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, e);
    }
    ok()
}

// -----------------------------
// DELETE /api/tasks
// Removes every record whose id matches the body's id
// -----------------------------
pub async fn delete_task(
    State(db): State<JsonFileDb>,
    Json(req): Json<DeleteRequest>,
) -> impl IntoResponse {
    let mut data = match db.load() {
        Ok(data) => data,
        Err(e) => return fail(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    tracing::info!(id = %req.id, "deleting task");
    data.tasks.retain(|t| t.id != req.id);

    if let Err(e) = db.save(&data) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, e);
    }
    ok()
}
