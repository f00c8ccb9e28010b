//! Shared test fixtures

use async_trait::async_trait;
use deploybot_core::domain::pipeline::Pipeline;
use deploybot_core::domain::status::{PipelineStatus, TaskStatus};
use deploybot_core::domain::task::Task;
use deploybot_core::dto::webhook::StreamWebhook;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

use crate::transport::{NotificationTransport, TransportError};

/// Records every delivery; URLs registered as failing return a 502
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(String, StreamWebhook)>>,
    failing: HashSet<String>,
}

impl RecordingTransport {
    pub fn failing_on(urls: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<(String, StreamWebhook)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn deliver(&self, url: &str, body: &StreamWebhook) -> Result<u16, TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        if self.failing.contains(url) {
            return Err(TransportError::Status(502));
        }
        Ok(200)
    }
}

pub fn pipeline(arguments: &[&str], tasks: Vec<Task>) -> Pipeline {
    Pipeline {
        id: Uuid::new_v4(),
        name: "deploy".to_string(),
        status: PipelineStatus::Idle,
        project_id: None,
        arguments: arguments.iter().map(|a| a.to_string()).collect(),
        auto_run: false,
        repo_watched: None,
        branch_watched: None,
        tasks,
        created_at: chrono::Utc::now(),
        updated_at: None,
        executed_at: None,
        stopped_at: None,
        scheduled_at: None,
    }
}

pub fn task(name: &str) -> Task {
    Task {
        id: Uuid::new_v4(),
        name: name.to_string(),
        status: TaskStatus::Pending,
        upstream_task_id: None,
        auto_run: false,
        stream_webhook: None,
        config: None,
        remarks: None,
        timeout: None,
        created_at: chrono::Utc::now(),
        updated_at: None,
        executed_at: None,
        stopped_at: None,
        scheduled_at: None,
    }
}

/// A task auto-triggered by `upstream`, notified at `webhook`
pub fn downstream(name: &str, upstream: &Task, webhook: &str) -> Task {
    Task {
        upstream_task_id: Some(upstream.id),
        auto_run: true,
        stream_webhook: Some(webhook.to_string()),
        ..task(name)
    }
}
