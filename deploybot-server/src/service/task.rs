//! Task Service
//!
//! Business logic for tasks embedded in a pipeline, including the status
//! transition that kicks off the completion cascade.

use deploybot_core::domain::status::{ClockStamp, TaskStatus};
use deploybot_core::domain::task::Task;
use deploybot_core::dto::task::{CreateTask, UpdateTask};
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::cascade::{Cascade, CascadeOutcome, CascadeTrigger};
use crate::repository::{GatewayError, PipelineGateway};

/// Service error type
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Pipeline {0} not found")]
    PipelineNotFound(Uuid),

    #[error("Task {task_id} not found in pipeline {pipeline_id}")]
    NotFound { pipeline_id: Uuid, task_id: Uuid },

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    PersistenceError(#[from] GatewayError),
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// Append a task to a pipeline
pub async fn create_task(
    gateway: &dyn PipelineGateway,
    pipeline_id: Uuid,
    req: CreateTask,
) -> Result<Task> {
    validate_name(&req.name)?;

    if req.id.is_some() && req.id == req.upstream_task_id {
        return Err(TaskError::ValidationError(
            "A task cannot be its own upstream".to_string(),
        ));
    }

    let task = gateway
        .create_task(pipeline_id, req)
        .await
        .map_err(|e| match e {
            GatewayError::Conflict(msg) => TaskError::ValidationError(msg),
            other => TaskError::PersistenceError(other),
        })?
        .ok_or(TaskError::PipelineNotFound(pipeline_id))?;

    tracing::info!("Task created: {} ({}) in pipeline {}", task.name, task.id, pipeline_id);

    Ok(task)
}

pub async fn get_task(
    gateway: &dyn PipelineGateway,
    pipeline_id: Uuid,
    task_id: Uuid,
) -> Result<Task> {
    gateway
        .get_task(pipeline_id, task_id)
        .await?
        .ok_or(TaskError::NotFound {
            pipeline_id,
            task_id,
        })
}

/// Update the descriptive fields of a task
pub async fn update_task(
    gateway: &dyn PipelineGateway,
    pipeline_id: Uuid,
    task_id: Uuid,
    req: UpdateTask,
) -> Result<()> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }

    if req.upstream_task_id == Some(task_id) {
        return Err(TaskError::ValidationError(
            "A task cannot be its own upstream".to_string(),
        ));
    }

    if !gateway.update_task(pipeline_id, task_id, req).await? {
        return Err(TaskError::NotFound {
            pipeline_id,
            task_id,
        });
    }

    Ok(())
}

pub async fn delete_task(
    gateway: &dyn PipelineGateway,
    pipeline_id: Uuid,
    task_id: Uuid,
) -> Result<()> {
    if !gateway.delete_task(pipeline_id, task_id).await? {
        return Err(TaskError::NotFound {
            pipeline_id,
            task_id,
        });
    }

    tracing::info!("Task deleted: {} from pipeline {}", task_id, pipeline_id);

    Ok(())
}

/// Persist a task status transition and start the completion cascade
///
/// The status write is the only synchronous part: validation and
/// persistence failures are returned to the caller and no cascade starts.
/// Once the write has succeeded the cascade is spawned and its handle is
/// returned; callers are free to drop it.
pub async fn transition_status(
    gateway: &dyn PipelineGateway,
    cascade: &Cascade,
    pipeline_id: Uuid,
    task_id: Uuid,
    raw_status: &str,
) -> Result<JoinHandle<CascadeOutcome>> {
    let status = raw_status
        .parse::<TaskStatus>()
        .map_err(|e| TaskError::ValidationError(e.to_string()))?;

    let updated = gateway
        .update_task_status(pipeline_id, task_id, status, ClockStamp::for_task(status))
        .await?;

    if !updated {
        return Err(TaskError::NotFound {
            pipeline_id,
            task_id,
        });
    }

    tracing::info!(
        "Task {} of pipeline {} transitioned to {}",
        task_id,
        pipeline_id,
        status
    );

    Ok(cascade.spawn(CascadeTrigger {
        pipeline_id,
        task_id,
        status,
    }))
}

// =============================================================================
// Validation
// =============================================================================

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TaskError::ValidationError(
            "Task name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > 255 {
        return Err(TaskError::ValidationError(
            "Task name is too long (max 255 characters)".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryPipelineGateway;
    use crate::testing::{self, RecordingTransport};
    use deploybot_core::domain::pipeline::Pipeline;
    use deploybot_core::domain::status::PipelineStatus;
    use deploybot_core::dto::pipeline::PipelineLookup;
    use deploybot_core::dto::task::TaskFilter;
    use std::sync::Arc;

    struct Fixture {
        gateway: Arc<InMemoryPipelineGateway>,
        transport: Arc<RecordingTransport>,
        cascade: Cascade,
    }

    fn fixture() -> Fixture {
        let gateway = Arc::new(InMemoryPipelineGateway::new());
        let transport = Arc::new(RecordingTransport::default());
        let cascade = Cascade::new(gateway.clone(), transport.clone());
        Fixture {
            gateway,
            transport,
            cascade,
        }
    }

    async fn load(gateway: &InMemoryPipelineGateway, id: Uuid) -> Pipeline {
        gateway
            .get_pipeline(&PipelineLookup::Id(id), TaskFilter::default())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_task_validation() {
        let f = fixture();
        let pipeline = testing::pipeline(&[], vec![]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let empty = CreateTask {
            name: " ".to_string(),
            ..Default::default()
        };
        let result = create_task(f.gateway.as_ref(), pipeline_id, empty).await;
        assert!(matches!(result, Err(TaskError::ValidationError(_))));

        let id = Uuid::new_v4();
        let own_upstream = CreateTask {
            id: Some(id),
            name: "a".to_string(),
            upstream_task_id: Some(id),
            ..Default::default()
        };
        let result = create_task(f.gateway.as_ref(), pipeline_id, own_upstream).await;
        assert!(matches!(result, Err(TaskError::ValidationError(_))));
    }

    #[test]
    fn test_validate_name_counts_characters() {
        assert!(matches!(
            validate_name(&"x".repeat(256)),
            Err(TaskError::ValidationError(_))
        ));
        assert!(validate_name(&"x".repeat(255)).is_ok());
        assert!(validate_name(&"é".repeat(200)).is_ok());
    }

    #[tokio::test]
    async fn test_task_name_length_is_bounded() {
        let f = fixture();
        let a = testing::task("a");
        let pipeline = testing::pipeline(&[], vec![a.clone()]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let long = CreateTask {
            name: "x".repeat(256),
            ..Default::default()
        };
        let result = create_task(f.gateway.as_ref(), pipeline_id, long).await;
        assert!(matches!(result, Err(TaskError::ValidationError(_))));

        let rename = UpdateTask {
            name: Some("x".repeat(256)),
            ..Default::default()
        };
        let result = update_task(f.gateway.as_ref(), pipeline_id, a.id, rename).await;
        assert!(matches!(result, Err(TaskError::ValidationError(_))));
        let task = get_task(f.gateway.as_ref(), pipeline_id, a.id).await.unwrap();
        assert_eq!(task.name, "a");
    }

    #[tokio::test]
    async fn test_duplicate_task_id_is_rejected_and_notified_once() {
        let f = fixture();
        let a = testing::task("a");
        let pipeline = testing::pipeline(&["env=prod"], vec![a.clone()]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let dup = Uuid::new_v4();
        let req = CreateTask {
            id: Some(dup),
            name: "b".to_string(),
            upstream_task_id: Some(a.id),
            auto_run: true,
            stream_webhook: Some("http://x/hook".to_string()),
            ..Default::default()
        };
        create_task(f.gateway.as_ref(), pipeline_id, req.clone())
            .await
            .unwrap();
        let second = create_task(f.gateway.as_ref(), pipeline_id, req).await;
        assert!(matches!(second, Err(TaskError::ValidationError(_))));

        let outcome = transition_status(f.gateway.as_ref(), &f.cascade, pipeline_id, a.id, "Done")
            .await
            .unwrap()
            .await
            .unwrap();

        assert_eq!(outcome.resolved, 1);
        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.payload.task_id, dup);
    }

    #[tokio::test]
    async fn test_create_task_in_missing_pipeline() {
        let f = fixture();
        let req = CreateTask {
            name: "a".to_string(),
            ..Default::default()
        };

        let result = create_task(f.gateway.as_ref(), Uuid::new_v4(), req).await;
        assert!(matches!(result, Err(TaskError::PipelineNotFound(_))));
    }

    #[tokio::test]
    async fn test_transition_unknown_task() {
        let f = fixture();
        let pipeline = testing::pipeline(&[], vec![testing::task("a")]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let result = transition_status(
            f.gateway.as_ref(),
            &f.cascade,
            pipeline_id,
            Uuid::new_v4(),
            "Done",
        )
        .await;

        assert!(matches!(result, Err(TaskError::NotFound { .. })));
        assert!(f.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_transition_rejects_unknown_status() {
        let f = fixture();
        let a = testing::task("a");
        let pipeline = testing::pipeline(&[], vec![a.clone()]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let result =
            transition_status(f.gateway.as_ref(), &f.cascade, pipeline_id, a.id, "Finished")
                .await;

        assert!(matches!(result, Err(TaskError::ValidationError(_))));
        let task = get_task(f.gateway.as_ref(), pipeline_id, a.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_in_progress_stamps_start_and_busies_pipeline() {
        let f = fixture();
        let mut a = testing::task("a");
        a.stopped_at = Some(chrono::Utc::now());
        let pipeline = testing::pipeline(&[], vec![a.clone()]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let handle =
            transition_status(f.gateway.as_ref(), &f.cascade, pipeline_id, a.id, "InProgress")
                .await
                .unwrap();
        handle.await.unwrap();

        let pipeline = load(&f.gateway, pipeline_id).await;
        let task = pipeline.task(a.id).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.executed_at.is_some());
        assert!(task.stopped_at.is_none());
        assert_eq!(pipeline.status, PipelineStatus::Busy);
        assert!(pipeline.executed_at.is_some());
    }

    #[tokio::test]
    async fn test_terminal_status_stamps_stop_and_idles_pipeline() {
        let f = fixture();
        let a = testing::task("a");
        let pipeline = testing::pipeline(&[], vec![a.clone()]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        for status in ["InProgress", "Failed"] {
            transition_status(f.gateway.as_ref(), &f.cascade, pipeline_id, a.id, status)
                .await
                .unwrap()
                .await
                .unwrap();
        }

        let pipeline = load(&f.gateway, pipeline_id).await;
        let task = pipeline.task(a.id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.executed_at.is_some());
        assert!(task.stopped_at.is_some());
        assert_eq!(pipeline.status, PipelineStatus::Idle);
        assert!(pipeline.stopped_at.is_some());
        assert!(f.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_done_notifies_downstream_end_to_end() {
        let f = fixture();
        let a = testing::task("a");
        let b = testing::downstream("b", &a, "http://x/hook");
        let manual = Task {
            auto_run: false,
            ..testing::downstream("manual", &a, "http://x/manual")
        };
        let pipeline = testing::pipeline(&["env=prod"], vec![a.clone(), b.clone(), manual]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let outcome = transition_status(f.gateway.as_ref(), &f.cascade, pipeline_id, a.id, "Done")
            .await
            .unwrap()
            .await
            .unwrap();

        assert_eq!(outcome.resolved, 1);
        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://x/hook");
        assert_eq!(sent[0].1.payload.task_id, b.id);
        assert_eq!(sent[0].1.payload.arguments, vec!["env=prod".to_string()]);

        let pipeline = load(&f.gateway, pipeline_id).await;
        assert_eq!(pipeline.status, PipelineStatus::Idle);
        assert!(pipeline.stopped_at.is_some());
        let done = pipeline.task(a.id).unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert!(done.stopped_at.is_some());
    }

    #[tokio::test]
    async fn test_repeated_transition_is_idempotent_on_status() {
        let f = fixture();
        let a = testing::task("a");
        let pipeline = testing::pipeline(&[], vec![a.clone()]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        for _ in 0..2 {
            transition_status(f.gateway.as_ref(), &f.cascade, pipeline_id, a.id, "Canceled")
                .await
                .unwrap()
                .await
                .unwrap();
        }

        let task = get_task(f.gateway.as_ref(), pipeline_id, a.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Canceled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_transitions_of_sibling_tasks() {
        let f = fixture();
        let a = testing::task("a");
        let b = testing::task("b");
        let pipeline = testing::pipeline(&[], vec![a.clone(), b.clone()]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let (first, second) = tokio::join!(
            transition_status(f.gateway.as_ref(), &f.cascade, pipeline_id, a.id, "Done"),
            transition_status(f.gateway.as_ref(), &f.cascade, pipeline_id, b.id, "Failed"),
        );
        first.unwrap().await.unwrap();
        second.unwrap().await.unwrap();

        let pipeline = load(&f.gateway, pipeline_id).await;
        assert_eq!(pipeline.task(a.id).unwrap().status, TaskStatus::Done);
        assert_eq!(pipeline.task(b.id).unwrap().status, TaskStatus::Failed);
        assert_eq!(pipeline.status, PipelineStatus::Idle);
    }

    #[tokio::test]
    async fn test_update_and_delete_task() {
        let f = fixture();
        let a = testing::task("a");
        let pipeline = testing::pipeline(&[], vec![a.clone()]);
        let pipeline_id = pipeline.id;
        f.gateway.insert(pipeline).await;

        let own_upstream = UpdateTask {
            upstream_task_id: Some(a.id),
            ..Default::default()
        };
        let result = update_task(f.gateway.as_ref(), pipeline_id, a.id, own_upstream).await;
        assert!(matches!(result, Err(TaskError::ValidationError(_))));

        let rename = UpdateTask {
            remarks: Some("nightly".to_string()),
            ..Default::default()
        };
        update_task(f.gateway.as_ref(), pipeline_id, a.id, rename)
            .await
            .unwrap();
        let task = get_task(f.gateway.as_ref(), pipeline_id, a.id).await.unwrap();
        assert_eq!(task.remarks.as_deref(), Some("nightly"));
        assert_eq!(task.name, "a");

        delete_task(f.gateway.as_ref(), pipeline_id, a.id)
            .await
            .unwrap();
        let result = get_task(f.gateway.as_ref(), pipeline_id, a.id).await;
        assert!(matches!(result, Err(TaskError::NotFound { .. })));
    }
}
