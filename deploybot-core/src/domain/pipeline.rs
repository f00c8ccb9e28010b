//! Pipeline domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::status::{ClockStamp, PipelineStatus};
use crate::domain::task::Task;

/// Pipeline definition
///
/// A named, ordered collection of tasks sharing a run context (`arguments`)
/// and an aggregate run status. Tasks are embedded and never stored apart
/// from their pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: Uuid,
    pub name: String,
    pub status: PipelineStatus,
    pub project_id: Option<Uuid>,
    /// Passed to every task triggered from this pipeline
    pub arguments: Vec<String>,
    pub auto_run: bool,
    pub repo_watched: Option<String>,
    pub branch_watched: Option<String>,
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    pub fn task(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Sets the status and moves the lifecycle timestamps
    pub fn apply_status(&mut self, status: PipelineStatus, stamp: ClockStamp, now: DateTime<Utc>) {
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
