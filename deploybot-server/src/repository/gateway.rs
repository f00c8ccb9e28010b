//! Persistence Gateway
//!
//! The narrow contract through which services and the completion cascade
//! read and write pipelines and their embedded tasks. Implemented over
//! PostgreSQL for production and in memory for tests and local runs.

use async_trait::async_trait;
use deploybot_core::domain::pipeline::Pipeline;
use deploybot_core::domain::status::{ClockStamp, PipelineStatus, TaskStatus};
use deploybot_core::domain::task::Task;
use deploybot_core::dto::pipeline::{CreatePipeline, PipelineLookup, PipelineQuery, UpdatePipeline};
use deploybot_core::dto::task::{CreateTask, TaskFilter, UpdateTask};
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::repository::{pipeline_repository, task_repository};

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by gateway implementations
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record could not be mapped onto the domain
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),

    /// The write would duplicate an existing identity
    #[error("{0}")]
    Conflict(String),
}

/// Read/write access to pipelines and their embedded tasks
///
/// Write operations return `false` when the addressed pipeline or task does
/// not exist. Status writes are single-record updates; concurrent writers
/// are not ordered and the last write wins.
#[async_trait]
pub trait PipelineGateway: Send + Sync {
    /// Fetch a pipeline by ID or name
    ///
    /// With a non-empty `filter` only the matching tasks are attached.
    async fn get_pipeline(
        &self,
        lookup: &PipelineLookup,
        filter: TaskFilter,
    ) -> GatewayResult<Option<Pipeline>>;

    async fn update_task_status(
        &self,
        pipeline_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
        stamp: ClockStamp,
    ) -> GatewayResult<bool>;

    async fn update_pipeline_status(
        &self,
        pipeline_id: Uuid,
        status: PipelineStatus,
        stamp: ClockStamp,
    ) -> GatewayResult<bool>;

    async fn create_pipeline(&self, req: CreatePipeline) -> GatewayResult<Pipeline>;

    /// Pipelines matching `query`, most recently executed first
    async fn list_pipelines(&self, query: &PipelineQuery) -> GatewayResult<Vec<Pipeline>>;

    async fn update_pipeline(&self, id: Uuid, req: UpdatePipeline) -> GatewayResult<bool>;

    async fn delete_pipeline(&self, id: Uuid) -> GatewayResult<bool>;

    /// Append a task; `None` when the pipeline does not exist
    async fn create_task(&self, pipeline_id: Uuid, req: CreateTask)
    -> GatewayResult<Option<Task>>;

    async fn get_task(&self, pipeline_id: Uuid, task_id: Uuid) -> GatewayResult<Option<Task>>;

    async fn update_task(
        &self,
        pipeline_id: Uuid,
        task_id: Uuid,
        req: UpdateTask,
    ) -> GatewayResult<bool>;

    async fn delete_task(&self, pipeline_id: Uuid, task_id: Uuid) -> GatewayResult<bool>;
}

/// PostgreSQL implementation of PipelineGateway
#[derive(Clone)]
pub struct PgPipelineGateway {
    pool: PgPool,
}

impl PgPipelineGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineGateway for PgPipelineGateway {
    async fn get_pipeline(
        &self,
        lookup: &PipelineLookup,
        filter: TaskFilter,
    ) -> GatewayResult<Option<Pipeline>> {
        let Some(row) = pipeline_repository::find(&self.pool, lookup).await? else {
            return Ok(None);
        };

        let tasks = task_repository::find_by_pipeline(&self.pool, row.id, filter)
            .await?
            .into_iter()
            .map(Task::try_from)
            .collect::<GatewayResult<Vec<_>>>()?;

        row.into_pipeline(tasks).map(Some)
    }

    async fn update_task_status(
        &self,
        pipeline_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
        stamp: ClockStamp,
    ) -> GatewayResult<bool> {
        let updated =
            task_repository::update_status(&self.pool, pipeline_id, task_id, status, stamp).await?;
        Ok(updated)
    }

    async fn update_pipeline_status(
        &self,
        pipeline_id: Uuid,
        status: PipelineStatus,
        stamp: ClockStamp,
    ) -> GatewayResult<bool> {
        let updated =
            pipeline_repository::update_status(&self.pool, pipeline_id, status, stamp).await?;
        Ok(updated)
    }

    async fn create_pipeline(&self, req: CreatePipeline) -> GatewayResult<Pipeline> {
        let pipeline = pipeline_repository::create(&self.pool, req).await?;
        Ok(pipeline)
    }

    async fn list_pipelines(&self, query: &PipelineQuery) -> GatewayResult<Vec<Pipeline>> {
        let rows = pipeline_repository::list(&self.pool, query).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut tasks_by_pipeline: HashMap<Uuid, Vec<Task>> = HashMap::new();
        for row in task_repository::find_by_pipelines(&self.pool, &ids).await? {
            let pipeline_id = row.pipeline_id;
            tasks_by_pipeline
                .entry(pipeline_id)
                .or_default()
                .push(Task::try_from(row)?);
        }

        rows.into_iter()
            .map(|row| {
                let tasks = tasks_by_pipeline.remove(&row.id).unwrap_or_default();
                row.into_pipeline(tasks)
            })
            .collect()
    }

    async fn update_pipeline(&self, id: Uuid, req: UpdatePipeline) -> GatewayResult<bool> {
        let updated = pipeline_repository::update(&self.pool, id, req).await?;
        Ok(updated)
    }

    async fn delete_pipeline(&self, id: Uuid) -> GatewayResult<bool> {
        let deleted = pipeline_repository::delete(&self.pool, id).await?;
        Ok(deleted)
    }

    async fn create_task(
        &self,
        pipeline_id: Uuid,
        req: CreateTask,
    ) -> GatewayResult<Option<Task>> {
        task_repository::create(&self.pool, pipeline_id, req).await
    }

    async fn get_task(&self, pipeline_id: Uuid, task_id: Uuid) -> GatewayResult<Option<Task>> {
        task_repository::find(&self.pool, pipeline_id, task_id)
            .await?
            .map(Task::try_from)
            .transpose()
    }

    async fn update_task(
        &self,
        pipeline_id: Uuid,
        task_id: Uuid,
        req: UpdateTask,
    ) -> GatewayResult<bool> {
        let updated = task_repository::update(&self.pool, pipeline_id, task_id, req).await?;
        Ok(updated)
    }

    async fn delete_task(&self, pipeline_id: Uuid, task_id: Uuid) -> GatewayResult<bool> {
        let deleted = task_repository::delete(&self.pool, pipeline_id, task_id).await?;
        Ok(deleted)
    }
}
