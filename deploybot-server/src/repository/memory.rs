//! In-memory Persistence Gateway
//!
//! Keeps pipelines in a map behind a tokio `RwLock`. Every write holds the
//! lock for a single record mutation, matching the single-statement updates
//! of the PostgreSQL adapter.

use async_trait::async_trait;
use chrono::Utc;
use deploybot_core::domain::pipeline::Pipeline;
use deploybot_core::domain::status::{ClockStamp, PipelineStatus, TaskStatus};
use deploybot_core::domain::task::Task;
use deploybot_core::dto::pipeline::{CreatePipeline, PipelineLookup, PipelineQuery, UpdatePipeline};
use deploybot_core::dto::task::{CreateTask, TaskFilter, UpdateTask};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::gateway::{GatewayError, GatewayResult, PipelineGateway};

#[derive(Default)]
pub struct InMemoryPipelineGateway {
    pipelines: RwLock<HashMap<Uuid, Pipeline>>,
}

impl InMemoryPipelineGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fully formed pipeline, replacing any with the same ID
    pub async fn insert(&self, pipeline: Pipeline) {
        self.pipelines.write().await.insert(pipeline.id, pipeline);
    }
}

#[async_trait]
impl PipelineGateway for InMemoryPipelineGateway {
    async fn get_pipeline(
        &self,
        lookup: &PipelineLookup,
        filter: TaskFilter,
    ) -> GatewayResult<Option<Pipeline>> {
        let pipelines = self.pipelines.read().await;

        let found = match lookup {
            PipelineLookup::Id(id) => pipelines.get(id),
            PipelineLookup::Name(name) => pipelines
                .values()
                .filter(|p| &p.name == name)
                .min_by_key(|p| p.created_at),
        };

        Ok(found.cloned().map(|mut pipeline| {
            if !filter.is_empty() {
                pipeline.tasks.retain(|t| filter.matches(t));
            }
            pipeline
        }))
    }

    async fn update_task_status(
        &self,
        pipeline_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
        stamp: ClockStamp,
    ) -> GatewayResult<bool> {
        let mut pipelines = self.pipelines.write().await;
        let task = pipelines
            .get_mut(&pipeline_id)
            .and_then(|p| p.task_mut(task_id));

        Ok(match task {
            Some(task) => {
                task.apply_status(status, stamp, Utc::now());
                true
            }
            None => false,
        })
    }

    async fn update_pipeline_status(
        &self,
        pipeline_id: Uuid,
        status: PipelineStatus,
        stamp: ClockStamp,
    ) -> GatewayResult<bool> {
        let mut pipelines = self.pipelines.write().await;

        Ok(match pipelines.get_mut(&pipeline_id) {
            Some(pipeline) => {
                pipeline.apply_status(status, stamp, Utc::now());
                true
            }
            None => false,
        })
    }

    async fn create_pipeline(&self, req: CreatePipeline) -> GatewayResult<Pipeline> {
        let pipeline = Pipeline {
            id: Uuid::new_v4(),
            name: req.name,
            status: PipelineStatus::Idle,
            project_id: req.project_id,
            arguments: req.arguments,
            auto_run: req.auto_run,
            repo_watched: req.repo_watched,
            branch_watched: req.branch_watched,
            tasks: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
            executed_at: None,
            stopped_at: None,
            scheduled_at: req.scheduled_at,
        };

        self.insert(pipeline.clone()).await;
        Ok(pipeline)
    }

    async fn list_pipelines(&self, query: &PipelineQuery) -> GatewayResult<Vec<Pipeline>> {
        let pipelines = self.pipelines.read().await;

        let mut items: Vec<Pipeline> = pipelines
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        // None sorts first under Option's Ord, so reversing puts never-executed last
        items.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));

        Ok(items)
    }

    async fn update_pipeline(&self, id: Uuid, req: UpdatePipeline) -> GatewayResult<bool> {
        let mut pipelines = self.pipelines.write().await;
        let Some(pipeline) = pipelines.get_mut(&id) else {
            return Ok(false);
        };

        if let Some(name) = req.name {
            pipeline.name = name;
        }
        if let Some(scheduled_at) = req.scheduled_at {
            pipeline.scheduled_at = Some(scheduled_at);
        }
        if let Some(auto_run) = req.auto_run {
            pipeline.auto_run = auto_run;
        }
        if let Some(arguments) = req.arguments {
            pipeline.arguments = arguments;
        }
        if let Some(repo) = req.repo_watched {
            pipeline.repo_watched = Some(repo);
        }
        if let Some(branch) = req.branch_watched {
            pipeline.branch_watched = Some(branch);
        }
        pipeline.updated_at = Some(Utc::now());

        Ok(true)
    }

    async fn delete_pipeline(&self, id: Uuid) -> GatewayResult<bool> {
        Ok(self.pipelines.write().await.remove(&id).is_some())
    }

    async fn create_task(
        &self,
        pipeline_id: Uuid,
        req: CreateTask,
    ) -> GatewayResult<Option<Task>> {
        let mut pipelines = self.pipelines.write().await;
        let Some(pipeline) = pipelines.get_mut(&pipeline_id) else {
            return Ok(None);
        };

        let id = req.id.unwrap_or_else(Uuid::new_v4);
        if pipeline.task(id).is_some() {
            return Err(GatewayError::Conflict(format!(
                "Task {} already exists in pipeline {}",
                id, pipeline_id
            )));
        }

        let task = Task {
            id,
            name: req.name,
            status: TaskStatus::Pending,
            upstream_task_id: req.upstream_task_id,
            auto_run: req.auto_run,
            stream_webhook: req.stream_webhook,
            config: req.config,
            remarks: req.remarks,
            timeout: req.timeout,
            created_at: Utc::now(),
            updated_at: None,
            executed_at: None,
            stopped_at: None,
            scheduled_at: req.scheduled_at,
        };
        pipeline.tasks.push(task.clone());

        Ok(Some(task))
    }

    async fn get_task(&self, pipeline_id: Uuid, task_id: Uuid) -> GatewayResult<Option<Task>> {
        let pipelines = self.pipelines.read().await;
        Ok(pipelines
            .get(&pipeline_id)
            .and_then(|p| p.task(task_id))
            .cloned())
    }

    async fn update_task(
        &self,
        pipeline_id: Uuid,
        task_id: Uuid,
        req: UpdateTask,
    ) -> GatewayResult<bool> {
        let mut pipelines = self.pipelines.write().await;
        let Some(task) = pipelines
            .get_mut(&pipeline_id)
            .and_then(|p| p.task_mut(task_id))
        else {
            return Ok(false);
        };

        if let Some(name) = req.name {
            task.name = name;
        }
        if let Some(scheduled_at) = req.scheduled_at {
            task.scheduled_at = Some(scheduled_at);
        }
        if let Some(config) = req.config {
            task.config = Some(config);
        }
        if let Some(remarks) = req.remarks {
            task.remarks = Some(remarks);
        }
        if let Some(auto_run) = req.auto_run {
            task.auto_run = auto_run;
        }
        if let Some(webhook) = req.stream_webhook {
            task.stream_webhook = Some(webhook);
        }
        if let Some(upstream) = req.upstream_task_id {
            task.upstream_task_id = Some(upstream);
        }
        if let Some(timeout) = req.timeout {
            task.timeout = Some(timeout);
        }
        task.updated_at = Some(Utc::now());

        Ok(true)
    }

    async fn delete_task(&self, pipeline_id: Uuid, task_id: Uuid) -> GatewayResult<bool> {
        let mut pipelines = self.pipelines.write().await;
        let Some(pipeline) = pipelines.get_mut(&pipeline_id) else {
            return Ok(false);
        };

        let before = pipeline.tasks.len();
        pipeline.tasks.retain(|t| t.id != task_id);
        Ok(pipeline.tasks.len() < before)
    }
}
