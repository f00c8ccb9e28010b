//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use deploybot_core::domain::pipeline::Pipeline;
use deploybot_core::dto::pipeline::{
    CreatePipeline, PipelineList, PipelineLookup, PipelineQuery, UpdatePipeline,
};
use deploybot_core::dto::{Created, StatusUpdate};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::pipeline_service;

/// Query of `GET /pipeline`; `id` wins when both are given
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub id: Option<Uuid>,
    pub name: Option<String>,
}

impl TryFrom<LookupParams> for PipelineLookup {
    type Error = ApiError;

    fn try_from(params: LookupParams) -> Result<Self, Self::Error> {
        match (params.id, params.name) {
            (Some(id), _) => Ok(PipelineLookup::Id(id)),
            (None, Some(name)) => Ok(PipelineLookup::Name(name)),
            (None, None) => Err(ApiError::BadRequest(
                "either id or name is required".to_string(),
            )),
        }
    }
}

/// GET /pipelines
/// List pipelines, optionally filtered
pub async fn list_pipelines(
    State(state): State<AppState>,
    Query(query): Query<PipelineQuery>,
) -> ApiResult<Json<PipelineList>> {
    tracing::debug!("Listing pipelines: {:?}", query);

    let list = pipeline_service::list_pipelines(state.gateway.as_ref(), query).await?;

    Ok(Json(list))
}

/// GET /pipeline?id=..|name=..
/// Get a pipeline with its tasks
pub async fn get_pipeline(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> ApiResult<Json<Pipeline>> {
    let lookup = PipelineLookup::try_from(params)?;
    tracing::debug!("Getting pipeline: {}", lookup);

    let pipeline = pipeline_service::get_pipeline(state.gateway.as_ref(), lookup).await?;

    Ok(Json(pipeline))
}

/// POST /pipeline
pub async fn create_pipeline(
    State(state): State<AppState>,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    tracing::info!("Creating pipeline: {}", req.name);

    let pipeline = pipeline_service::create_pipeline(state.gateway.as_ref(), req).await?;

    Ok((StatusCode::CREATED, Json(Created { id: pipeline.id })))
}

/// PATCH /pipeline/{id}
pub async fn update_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePipeline>,
) -> ApiResult<StatusCode> {
    pipeline_service::update_pipeline(state.gateway.as_ref(), id, req).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /pipeline/{id}
/// Delete a pipeline and its tasks
pub async fn delete_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);

    pipeline_service::delete_pipeline(state.gateway.as_ref(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /pipeline/{id}/status
pub async fn update_pipeline_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> ApiResult<StatusCode> {
    pipeline_service::set_status(state.gateway.as_ref(), id, &req.status).await?;

    Ok(StatusCode::NO_CONTENT)
}
