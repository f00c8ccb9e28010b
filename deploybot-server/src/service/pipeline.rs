//! Pipeline Service
//!
//! Business logic for pipeline management.

use deploybot_core::domain::pipeline::Pipeline;
use deploybot_core::domain::status::{ClockStamp, PipelineStatus};
use deploybot_core::dto::pipeline::{
    CreatePipeline, PipelineList, PipelineLookup, PipelineQuery, UpdatePipeline,
};
use deploybot_core::dto::task::TaskFilter;
use thiserror::Error;
use uuid::Uuid;

use crate::repository::{GatewayError, PipelineGateway};

/// Service error type
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline {0} not found")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    PersistenceError(#[from] GatewayError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Create a new pipeline
pub async fn create_pipeline(gateway: &dyn PipelineGateway, req: CreatePipeline) -> Result<Pipeline> {
    validate_name(&req.name)?;

    let pipeline = gateway.create_pipeline(req).await?;

    tracing::info!("Pipeline created: {} ({})", pipeline.name, pipeline.id);

    Ok(pipeline)
}

/// Get a pipeline, with all of its tasks, by ID or name
pub async fn get_pipeline(gateway: &dyn PipelineGateway, lookup: PipelineLookup) -> Result<Pipeline> {
    gateway
        .get_pipeline(&lookup, TaskFilter::default())
        .await?
        .ok_or_else(|| PipelineError::NotFound(lookup.to_string()))
}

/// List pipelines matching the query
pub async fn list_pipelines(
    gateway: &dyn PipelineGateway,
    query: PipelineQuery,
) -> Result<PipelineList> {
    let pipelines = gateway.list_pipelines(&query).await?;
    Ok(pipelines.into())
}

/// Update a pipeline
pub async fn update_pipeline(
    gateway: &dyn PipelineGateway,
    id: Uuid,
    req: UpdatePipeline,
) -> Result<()> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }

    if !gateway.update_pipeline(id, req).await? {
        return Err(PipelineError::NotFound(id.to_string()));
    }

    tracing::info!("Pipeline updated: {}", id);

    Ok(())
}

/// Delete a pipeline together with its tasks
pub async fn delete_pipeline(gateway: &dyn PipelineGateway, id: Uuid) -> Result<()> {
    if !gateway.delete_pipeline(id).await? {
        return Err(PipelineError::NotFound(id.to_string()));
    }

    tracing::info!("Pipeline deleted: {}", id);

    Ok(())
}

/// Explicitly set the aggregate status of a pipeline
pub async fn set_status(gateway: &dyn PipelineGateway, id: Uuid, raw_status: &str) -> Result<()> {
    let status = raw_status
        .parse::<PipelineStatus>()
        .map_err(|e| PipelineError::ValidationError(e.to_string()))?;

    if !gateway
        .update_pipeline_status(id, status, ClockStamp::for_pipeline(status))
        .await?
    {
        return Err(PipelineError::NotFound(id.to_string()));
    }

    tracing::info!("Pipeline {} status set to {}", id, status);

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Pipeline name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > 255 {
        return Err(PipelineError::ValidationError(
            "Pipeline name is too long (max 255 characters)".to_string(),
        ));
    }

    Ok(())
}
