//! Task-completion cascade
//!
//! After a task status write has been persisted and answered, the cascade
//! resolves the downstream tasks to trigger (only when the task reached
//! Done), notifies each of them and finally updates the owning pipeline's
//! aggregate status.
//!
//! The cascade runs on its own tokio task. It is not awaited by the request
//! that triggered it and is not part of that request's success or failure:
//! every error inside it is logged and swallowed. There is no cancellation
//! hook and no overall deadline; each webhook call is bounded by the
//! transport's own timeout.

pub mod aggregator;
pub mod dispatcher;
pub mod resolver;

use deploybot_core::domain::status::{PipelineStatus, TaskStatus};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

use crate::repository::PipelineGateway;
use crate::transport::NotificationTransport;
use dispatcher::DispatchReport;
use resolver::Downstream;

/// The persisted transition that starts a cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeTrigger {
    pub pipeline_id: Uuid,
    pub task_id: Uuid,
    pub status: TaskStatus,
}

/// What a cascade did, for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub resolved: usize,
    pub dispatch: DispatchReport,
    /// `None` when the pipeline status write failed or found no pipeline
    pub pipeline_status: Option<PipelineStatus>,
}

#[derive(Clone)]
pub struct Cascade {
    gateway: Arc<dyn PipelineGateway>,
    transport: Arc<dyn NotificationTransport>,
}

impl Cascade {
    pub fn new(
        gateway: Arc<dyn PipelineGateway>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        Self { gateway, transport }
    }

    /// Runs the cascade on a detached tokio task
    ///
    /// Dropping the returned handle does not cancel the cascade.
    pub fn spawn(&self, trigger: CascadeTrigger) -> JoinHandle<CascadeOutcome> {
        let cascade = self.clone();
        let span = info_span!(
            "cascade",
            pipeline_id = %trigger.pipeline_id,
            task_id = %trigger.task_id,
            status = %trigger.status,
        );

        tokio::spawn(async move { cascade.run(trigger).await }.instrument(span))
    }

    /// Resolve, dispatch, aggregate
    pub async fn run(&self, trigger: CascadeTrigger) -> CascadeOutcome {
        let downstream = if trigger.status == TaskStatus::Done {
            self.resolve(trigger).await
        } else {
            Downstream::default()
        };

        let dispatch =
            dispatcher::dispatch(self.transport.as_ref(), trigger.pipeline_id, &downstream).await;

        let pipeline_status = aggregator::apply(
            self.gateway.as_ref(),
            trigger.pipeline_id,
            trigger.status,
            downstream.len(),
        )
        .await;

        CascadeOutcome {
            resolved: downstream.len(),
            dispatch,
            pipeline_status,
        }
    }

    async fn resolve(&self, trigger: CascadeTrigger) -> Downstream {
        match resolver::resolve_downstream(
            self.gateway.as_ref(),
            trigger.pipeline_id,
            trigger.task_id,
        )
        .await
        {
            Ok(downstream) => downstream,
            Err(e) => {
                warn!(
                    "Failed to resolve downstream tasks of {}: {}",
                    trigger.task_id, e
                );
                Downstream::default()
            }
        }
    }
}
