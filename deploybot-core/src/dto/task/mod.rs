//! Task DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::task::Task;

/// Request to add a task to a pipeline
///
/// When `id` is absent one is generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub upstream_task_id: Option<Uuid>,
    #[serde(default)]
    pub auto_run: bool,
    #[serde(default)]
    pub stream_webhook: Option<String>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub timeout: Option<i64>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Partial update of a task; status is not updatable through this path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub config: Option<serde_json::Value>,
    pub remarks: Option<String>,
    pub auto_run: Option<bool>,
    pub stream_webhook: Option<String>,
    pub upstream_task_id: Option<Uuid>,
    pub timeout: Option<i64>,
}

/// Narrows the tasks returned alongside a pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub upstream_task_id: Option<Uuid>,
    pub auto_run: Option<bool>,
}

impl TaskFilter {
    /// Tasks auto-triggered by the completion of `upstream_task_id`
    pub fn downstream_of(upstream_task_id: Uuid) -> Self {
        TaskFilter {
            upstream_task_id: Some(upstream_task_id),
            auto_run: Some(true),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upstream_task_id.is_none() && self.auto_run.is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.upstream_task_id
            .is_none_or(|upstream| task.upstream_task_id == Some(upstream))
            && self.auto_run.is_none_or(|auto| task.auto_run == auto)
    }
}
