//! Task Repository
//!
//! Handles all database operations on the `tasks` table. Every query is
//! scoped by `pipeline_id`; a task is never addressed on its own.

use chrono::{DateTime, Utc};
use deploybot_core::domain::status::{ClockStamp, TaskStatus};
use deploybot_core::domain::task::Task;
use deploybot_core::dto::task::{CreateTask, TaskFilter, UpdateTask};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::gateway::GatewayError;

const TASK_COLUMNS: &str = r#"
    pipeline_id, id, name, status, upstream_task_id, auto_run, stream_webhook,
    config, remarks, timeout_seconds, created_at, updated_at, executed_at,
    stopped_at, scheduled_at
"#;

/// Append a task to a pipeline
///
/// Returns `None` when the pipeline does not exist.
pub async fn create(
    pool: &PgPool,
    pipeline_id: Uuid,
    req: CreateTask,
) -> Result<Option<Task>, GatewayError> {
    let id = req.id.unwrap_or_else(Uuid::new_v4);
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (
            pipeline_id, id, name, status, upstream_task_id, auto_run,
            stream_webhook, config, remarks, timeout_seconds, created_at, scheduled_at
        )
        SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
        WHERE EXISTS (SELECT 1 FROM pipelines WHERE id = $1)
        "#,
    )
    .bind(pipeline_id)
    .bind(id)
    .bind(&req.name)
    .bind(TaskStatus::Pending.as_str())
    .bind(req.upstream_task_id)
    .bind(req.auto_run)
    .bind(&req.stream_webhook)
    .bind(&req.config)
    .bind(&req.remarks)
    .bind(req.timeout)
    .bind(now)
    .bind(req.scheduled_at)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => GatewayError::Conflict(format!(
            "Task {} already exists in pipeline {}",
            id, pipeline_id
        )),
        other => GatewayError::Database(other),
    })?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    Ok(Some(Task {
        id,
        name: req.name,
        status: TaskStatus::Pending,
        upstream_task_id: req.upstream_task_id,
        auto_run: req.auto_run,
        stream_webhook: req.stream_webhook,
        config: req.config,
        remarks: req.remarks,
        timeout: req.timeout,
        created_at: now,
        updated_at: None,
        executed_at: None,
        stopped_at: None,
        scheduled_at: req.scheduled_at,
    }))
}

/// Find a single task of a pipeline
pub async fn find(
    pool: &PgPool,
    pipeline_id: Uuid,
    task_id: Uuid,
) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE pipeline_id = $1 AND id = $2"
    ))
    .bind(pipeline_id)
    .bind(task_id)
    .fetch_optional(pool)
    .await
}

/// Tasks of one pipeline matching the filter, in insertion order
pub async fn find_by_pipeline(
    pool: &PgPool,
    pipeline_id: Uuid,
    filter: TaskFilter,
) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        r#"
        SELECT {TASK_COLUMNS}
        FROM tasks
        WHERE pipeline_id = $1
          AND ($2::uuid IS NULL OR upstream_task_id = $2)
          AND ($3::boolean IS NULL OR auto_run = $3)
        ORDER BY position
        "#
    ))
    .bind(pipeline_id)
    .bind(filter.upstream_task_id)
    .bind(filter.auto_run)
    .fetch_all(pool)
    .await
}

/// All tasks of several pipelines, in insertion order
pub async fn find_by_pipelines(
    pool: &PgPool,
    pipeline_ids: &[Uuid],
) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE pipeline_id = ANY($1) ORDER BY position"
    ))
    .bind(pipeline_ids)
    .fetch_all(pool)
    .await
}

/// Apply a partial update; absent fields keep their stored value
pub async fn update(
    pool: &PgPool,
    pipeline_id: Uuid,
    task_id: Uuid,
    req: UpdateTask,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET name = COALESCE($1, name),
            scheduled_at = COALESCE($2, scheduled_at),
            config = COALESCE($3, config),
            remarks = COALESCE($4, remarks),
            auto_run = COALESCE($5, auto_run),
            stream_webhook = COALESCE($6, stream_webhook),
            upstream_task_id = COALESCE($7, upstream_task_id),
            timeout_seconds = COALESCE($8, timeout_seconds),
            updated_at = $9
        WHERE pipeline_id = $10 AND id = $11
        "#,
    )
    .bind(&req.name)
    .bind(req.scheduled_at)
    .bind(&req.config)
    .bind(&req.remarks)
    .bind(req.auto_run)
    .bind(&req.stream_webhook)
    .bind(req.upstream_task_id)
    .bind(req.timeout)
    .bind(Utc::now())
    .bind(pipeline_id)
    .bind(task_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Set a task's status in a single statement, moving its timestamps
pub async fn update_status(
    pool: &PgPool,
    pipeline_id: Uuid,
    task_id: Uuid,
    status: TaskStatus,
    stamp: ClockStamp,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET status = $1,
            executed_at = CASE WHEN $2::text = 'started' THEN $3 ELSE executed_at END,
            stopped_at = CASE
                WHEN $2::text = 'started' THEN NULL
                WHEN $2::text = 'stopped' THEN $3
                ELSE stopped_at
            END
        WHERE pipeline_id = $4 AND id = $5
        "#,
    )
    .bind(status.as_str())
    .bind(stamp_mode(stamp))
    .bind(Utc::now())
    .bind(pipeline_id)
    .bind(task_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a task from its pipeline
pub async fn delete(pool: &PgPool, pipeline_id: Uuid, task_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE pipeline_id = $1 AND id = $2")
        .bind(pipeline_id)
        .bind(task_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Helper Functions
// =============================================================================

pub(crate) fn stamp_mode(stamp: ClockStamp) -> &'static str {
    match stamp {
        ClockStamp::Started => "started",
        ClockStamp::Stopped => "stopped",
        ClockStamp::Unchanged => "unchanged",
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
pub struct TaskRow {
    pub pipeline_id: Uuid,
    id: Uuid,
    name: String,
    status: String,
    upstream_task_id: Option<Uuid>,
    auto_run: bool,
    stream_webhook: Option<String>,
    config: Option<serde_json::Value>,
    remarks: Option<String>,
    timeout_seconds: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    executed_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    scheduled_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for Task {
    type Error = GatewayError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<TaskStatus>()
            .map_err(|e| GatewayError::InvalidRecord(format!("task {}: {}", row.id, e)))?;

        Ok(Task {
            id: row.id,
            name: row.name,
            status,
            upstream_task_id: row.upstream_task_id,
            auto_run: row.auto_run,
            stream_webhook: row.stream_webhook,
            config: row.config,
            remarks: row.remarks,
            timeout: row.timeout_seconds,
            created_at: row.created_at,
            updated_at: row.updated_at,
            executed_at: row.executed_at,
            stopped_at: row.stopped_at,
            scheduled_at: row.scheduled_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_mode_names() {
        assert_eq!(stamp_mode(ClockStamp::Started), "started");
        assert_eq!(stamp_mode(ClockStamp::Stopped), "stopped");
        assert_eq!(stamp_mode(ClockStamp::Unchanged), "unchanged");
    }
}
