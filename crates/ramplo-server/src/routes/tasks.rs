use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use ramplo_core::task::Task;
use serde::Deserialize;

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub week: Option<u32>,
    pub day: Option<u32>,
}

/// GET /api/tasks?week&day: the caller's tasks, optionally for one week or slot.
pub async fn list_tasks(
    State(app): State<AppState>,
    caller: Caller,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = tokio::task::spawn_blocking(move || {
        app.store.tasks(caller.id(), query.week, query.day)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(tasks))
}

/// PATCH /api/tasks/:id/complete: mark one of the caller's tasks done.
pub async fn complete_task(
    State(app): State<AppState>,
    caller: Caller,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = tokio::task::spawn_blocking(move || {
        app.tracker.complete_task(caller.id(), &task_id, Utc::now())
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(task))
}
