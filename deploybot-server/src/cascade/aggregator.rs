//! Pipeline Status Aggregator
//!
//! Derives the pipeline's coarse run status from the triggering task's new
//! status. The pipeline collapses to Idle as soon as the triggering task
//! leaves InProgress, even when downstream tasks were just notified.

use deploybot_core::domain::status::{ClockStamp, PipelineStatus, TaskStatus};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::repository::PipelineGateway;

/// Pipeline status and clock movement for a task transition
///
/// `matches` is the number of downstream tasks resolved by the cascade; it
/// does not keep the pipeline Busy.
pub fn aggregate(trigger: TaskStatus, matches: usize) -> (PipelineStatus, ClockStamp) {
    match (trigger, matches > 0) {
        (TaskStatus::InProgress, _) => (PipelineStatus::Busy, ClockStamp::Started),
        (TaskStatus::Done, false) => (PipelineStatus::Idle, ClockStamp::Stopped),
        // Notified downstream tasks report their own InProgress later
        (TaskStatus::Done, true) => (PipelineStatus::Idle, ClockStamp::Stopped),
        (TaskStatus::Failed | TaskStatus::Canceled, _) => {
            (PipelineStatus::Idle, ClockStamp::Stopped)
        }
        (TaskStatus::Pending, _) => (PipelineStatus::Idle, ClockStamp::Unchanged),
    }
}

/// Persist the aggregated status; failures are logged and swallowed
pub async fn apply(
    gateway: &dyn PipelineGateway,
    pipeline_id: Uuid,
    trigger: TaskStatus,
    matches: usize,
) -> Option<PipelineStatus> {
    let (status, stamp) = aggregate(trigger, matches);

    match gateway
        .update_pipeline_status(pipeline_id, status, stamp)
        .await
    {
        Ok(true) => {
            debug!(
                "Pipeline {} set to {} after task turned {} ({} downstream)",
                pipeline_id, status, trigger, matches
            );
            Some(status)
        }
        Ok(false) => {
            warn!(
                "Pipeline {} disappeared before its status could be set to {}",
                pipeline_id, status
            );
            None
        }
        Err(e) => {
            error!("Failed to set pipeline {} status to {}: {}", pipeline_id, status, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryPipelineGateway;
    use crate::testing;
    use deploybot_core::dto::pipeline::PipelineLookup;
    use deploybot_core::dto::task::TaskFilter;

    #[test]
    fn test_in_progress_makes_pipeline_busy() {
        assert_eq!(
            aggregate(TaskStatus::InProgress, 0),
            (PipelineStatus::Busy, ClockStamp::Started)
        );
    }

    #[test]
    fn test_done_collapses_to_idle_regardless_of_matches() {
        assert_eq!(
            aggregate(TaskStatus::Done, 0),
            (PipelineStatus::Idle, ClockStamp::Stopped)
        );
        assert_eq!(
            aggregate(TaskStatus::Done, 3),
            (PipelineStatus::Idle, ClockStamp::Stopped)
        );
    }

    #[test]
    fn test_other_terminal_statuses_stop_the_clock() {
        for status in [TaskStatus::Failed, TaskStatus::Canceled] {
            assert_eq!(
                aggregate(status, 0),
                (PipelineStatus::Idle, ClockStamp::Stopped)
            );
        }
    }

    #[test]
    fn test_pending_is_idle_without_stamping() {
        assert_eq!(
            aggregate(TaskStatus::Pending, 0),
            (PipelineStatus::Idle, ClockStamp::Unchanged)
        );
    }

    #[tokio::test]
    async fn test_apply_persists_status() {
        let pipeline = testing::pipeline(&[], vec![]);
        let pipeline_id = pipeline.id;
        let gateway = InMemoryPipelineGateway::new();
        gateway.insert(pipeline).await;

        let applied = apply(&gateway, pipeline_id, TaskStatus::InProgress, 0).await;
        assert_eq!(applied, Some(PipelineStatus::Busy));

        let stored = gateway
            .get_pipeline(&PipelineLookup::Id(pipeline_id), TaskFilter::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PipelineStatus::Busy);
        assert!(stored.executed_at.is_some());
        assert!(stored.stopped_at.is_none());
    }

    #[tokio::test]
    async fn test_apply_on_missing_pipeline_is_swallowed() {
        let gateway = InMemoryPipelineGateway::new();
        let applied = apply(&gateway, Uuid::new_v4(), TaskStatus::Done, 0).await;
        assert_eq!(applied, None);
    }
}
