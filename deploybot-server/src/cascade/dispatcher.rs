//! Cascade Dispatcher
//!
//! Sends one stream-webhook notification per resolved downstream task.
//! Deliveries are sequential and independent: a failure is logged and the
//! remaining tasks are still notified. Nothing is retried.

use deploybot_core::dto::webhook::StreamWebhook;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cascade::resolver::Downstream;
use crate::transport::NotificationTransport;

/// Outcome of one dispatch round, kept for observability only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    /// Tasks without a stream webhook
    pub skipped: usize,
}

pub async fn dispatch(
    transport: &dyn NotificationTransport,
    pipeline_id: Uuid,
    downstream: &Downstream,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for task in &downstream.tasks {
        let Some(url) = task.stream_webhook.as_deref().filter(|u| !u.trim().is_empty()) else {
            warn!(
                "Task {} of pipeline {} has no stream webhook, skipping",
                task.id, pipeline_id
            );
            report.skipped += 1;
            continue;
        };

        let body = StreamWebhook::new(pipeline_id, task.id, downstream.arguments.clone());

        match transport.deliver(url, &body).await {
            Ok(status) => {
                info!(
                    "Triggered task {} of pipeline {} via {} ({})",
                    task.id, pipeline_id, url, status
                );
                report.delivered += 1;
            }
            Err(e) => {
                warn!(
                    "Failed to trigger task {} of pipeline {} via {}: {}",
                    task.id, pipeline_id, url, e
                );
                report.failed += 1;
            }
        }
    }

    report
}
