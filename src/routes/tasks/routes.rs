use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::dto::{CreateTask, TaskListResponse, TaskResponse, UpdateStatus, UpdateTask};
use crate::error::{AppError, AppResult};
use crate::models::Task;
use crate::query::{ListTasksParams, TaskFilter};
use crate::routes::extract::{JsonBody, PathParam, QueryParams};
use crate::routes::middleware_auth::CurrentOwner;
use crate::state::AppState;

/// Loads a task and checks it belongs to `owner`.
async fn owned_task(state: &AppState, owner: Uuid, id: Uuid) -> AppResult<Task> {
    let task = state
        .tasks
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    if task.user_id != owner {
        tracing::warn!(task_id = %id, user_id = %owner, "task ownership mismatch");
        return Err(AppError::Forbidden(
            "Not authorized to access this task".to_string(),
        ));
    }

    Ok(task)
}

async fn save(state: &AppState, task: &Task) -> AppResult<()> {
    if state.tasks.replace(task).await? {
        Ok(())
    } else {
        // deleted between the read and the write
        Err(AppError::NotFound("Task not found".to_string()))
    }
}

pub async fn create(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
    JsonBody(body): JsonBody<CreateTask>,
) -> AppResult<impl IntoResponse> {
    let draft = body.into_draft()?;
    let task = Task::create(user_id, draft, Utc::now());
    state.tasks.insert(&task).await?;

    tracing::debug!(task_id = %task.id, "created task");
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            success: true,
            task,
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
    QueryParams(params): QueryParams<ListTasksParams>,
) -> AppResult<Json<TaskListResponse>> {
    let filter = TaskFilter::from(&params);
    let tasks = state
        .tasks
        .find_by_owner_with_filter(user_id, &filter)
        .await?;

    Ok(Json(TaskListResponse {
        success: true,
        count: tasks.len(),
        tasks,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<TaskResponse>> {
    let task = owned_task(&state, user_id, id).await?;
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<UpdateTask>,
) -> AppResult<Json<TaskResponse>> {
    let current = owned_task(&state, user_id, id).await?;
    let draft = body.merge_into(&current)?;
    let task = current.revise(draft, Utc::now());
    save(&state, &task).await?;

    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

pub async fn update_status(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<UpdateStatus>,
) -> AppResult<Json<TaskResponse>> {
    let current = owned_task(&state, user_id, id).await?;
    let draft = body.merge_into(&current)?;
    let task = current.revise(draft, Utc::now());
    save(&state, &task).await?;

    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    owned_task(&state, user_id, id).await?;
    if !state.tasks.delete(id).await? {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Task deleted successfully"
    })))
}
