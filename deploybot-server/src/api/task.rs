//! Task API Handlers
//!
//! HTTP endpoints for the tasks of a pipeline.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use deploybot_core::domain::task::Task;
use deploybot_core::dto::task::{CreateTask, UpdateTask};
use deploybot_core::dto::{Created, StatusUpdate};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::task_service;

/// POST /pipeline/{pipeline_id}/task
pub async fn create_task(
    State(state): State<AppState>,
    Path(pipeline_id): Path<Uuid>,
    Json(req): Json<CreateTask>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let task = task_service::create_task(state.gateway.as_ref(), pipeline_id, req).await?;

    Ok((StatusCode::CREATED, Json(Created { id: task.id })))
}

/// GET /pipeline/{pipeline_id}/task/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    Path((pipeline_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Task>> {
    let task = task_service::get_task(state.gateway.as_ref(), pipeline_id, task_id).await?;

    Ok(Json(task))
}

/// PATCH /pipeline/{pipeline_id}/task/{task_id}
pub async fn update_task(
    State(state): State<AppState>,
    Path((pipeline_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateTask>,
) -> ApiResult<StatusCode> {
    task_service::update_task(state.gateway.as_ref(), pipeline_id, task_id, req).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /pipeline/{pipeline_id}/task/{task_id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path((pipeline_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    task_service::delete_task(state.gateway.as_ref(), pipeline_id, task_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /pipeline/{pipeline_id}/task/{task_id}/status
///
/// Answers as soon as the status is persisted. The completion cascade is
/// spawned before this handler returns, so on a multi-threaded runtime it may
/// start, or even finish, before the 204 reaches the client. Nothing joins
/// it: its handle is dropped here and its outcome never affects the
/// response.
pub async fn update_task_status(
    State(state): State<AppState>,
    Path((pipeline_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<StatusUpdate>,
) -> ApiResult<StatusCode> {
    tracing::info!(
        "Updating task {} of pipeline {} to {}",
        task_id,
        pipeline_id,
        req.status
    );

    let _cascade = task_service::transition_status(
        state.gateway.as_ref(),
        &state.cascade,
        pipeline_id,
        task_id,
        &req.status,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
