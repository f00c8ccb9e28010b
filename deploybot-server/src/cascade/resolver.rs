//! Downstream Task Resolver
//!
//! Finds the sibling tasks configured to auto-trigger off a completed task.

use deploybot_core::domain::task::Task;
use deploybot_core::dto::pipeline::PipelineLookup;
use deploybot_core::dto::task::TaskFilter;
use uuid::Uuid;

use crate::repository::{GatewayResult, PipelineGateway};

/// Tasks to notify, together with the pipeline's run context
#[derive(Debug, Clone, Default)]
pub struct Downstream {
    pub arguments: Vec<String>,
    pub tasks: Vec<Task>,
}

impl Downstream {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Resolve every task whose `upstream_task_id` is `completed_task_id` and
/// whose `auto_run` flag is set
///
/// A pipeline deleted in the meantime resolves to nothing.
pub async fn resolve_downstream(
    gateway: &dyn PipelineGateway,
    pipeline_id: Uuid,
    completed_task_id: Uuid,
) -> GatewayResult<Downstream> {
    let pipeline = gateway
        .get_pipeline(
            &PipelineLookup::Id(pipeline_id),
            TaskFilter::downstream_of(completed_task_id),
        )
        .await?;

    Ok(match pipeline {
        Some(pipeline) => Downstream {
            arguments: pipeline.arguments,
            tasks: pipeline.tasks,
        },
        None => Downstream::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryPipelineGateway;
    use crate::testing;

    #[tokio::test]
    async fn test_resolves_all_auto_run_children() {
        let upstream = testing::task("build");
        let first = testing::downstream("deploy-eu", &upstream, "http://eu/hook");
        let second = testing::downstream("deploy-us", &upstream, "http://us/hook");
        let manual = deploybot_core::domain::task::Task {
            auto_run: false,
            ..testing::downstream("deploy-ap", &upstream, "http://ap/hook")
        };
        let unrelated = testing::downstream("smoke", &first, "http://smoke/hook");
        let pipeline = testing::pipeline(
            &["env=prod"],
            vec![
                upstream.clone(),
                first.clone(),
                second.clone(),
                manual,
                unrelated,
            ],
        );
        let pipeline_id = pipeline.id;

        let gateway = InMemoryPipelineGateway::new();
        gateway.insert(pipeline).await;

        let resolved = resolve_downstream(&gateway, pipeline_id, upstream.id)
            .await
            .unwrap();

        assert_eq!(resolved.arguments, vec!["env=prod".to_string()]);
        let ids: Vec<Uuid> = resolved.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_no_children_resolves_empty() {
        let upstream = testing::task("build");
        let pipeline = testing::pipeline(&[], vec![upstream.clone()]);
        let pipeline_id = pipeline.id;

        let gateway = InMemoryPipelineGateway::new();
        gateway.insert(pipeline).await;

        let resolved = resolve_downstream(&gateway, pipeline_id, upstream.id)
            .await
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn test_missing_pipeline_resolves_empty() {
        let gateway = InMemoryPipelineGateway::new();

        let resolved = resolve_downstream(&gateway, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        assert!(resolved.is_empty());
        assert!(resolved.arguments.is_empty());
    }
}
