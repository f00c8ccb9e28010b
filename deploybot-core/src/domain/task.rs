//! Task domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::status::{ClockStamp, TaskStatus};

/// A unit of work embedded in a pipeline
///
/// `upstream_task_id` forms a directed edge: when the upstream task reaches
/// Done, this task is notified through its `stream_webhook` provided
/// `auto_run` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub status: TaskStatus,
    pub upstream_task_id: Option<Uuid>,
    pub auto_run: bool,
    pub stream_webhook: Option<String>,
    pub config: Option<serde_json::Value>,
    pub remarks: Option<String>,
    /// Seconds
    pub timeout: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Sets the status and moves the lifecycle timestamps
    pub fn apply_status(&mut self, status: TaskStatus, stamp: ClockStamp, now: DateTime<Utc>) {
        self.status = status;
        match stamp {
            ClockStamp::Started => {
                self.executed_at = Some(now);
                self.stopped_at = None;
            }
            ClockStamp::Stopped => self.stopped_at = Some(now),
            ClockStamp::Unchanged => {}
        }
    }
}
