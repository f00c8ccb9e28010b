//! Pipeline Repository
//!
//! Handles all database operations on the `pipelines` table. Embedded tasks
//! are loaded through the task repository.

use chrono::{DateTime, Utc};
use deploybot_core::domain::pipeline::Pipeline;
use deploybot_core::domain::status::{ClockStamp, PipelineStatus};
use deploybot_core::dto::pipeline::{CreatePipeline, PipelineLookup, PipelineQuery, UpdatePipeline};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::gateway::GatewayError;
use crate::repository::task::stamp_mode;

const PIPELINE_COLUMNS: &str = r#"
    id, name, status, project_id, arguments, auto_run, repo_watched, branch_watched,
    created_at, updated_at, executed_at, stopped_at, scheduled_at
"#;

/// Insert a new pipeline; it starts Idle with no tasks
pub async fn create(pool: &PgPool, req: CreatePipeline) -> Result<Pipeline, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO pipelines (
            id, name, status, project_id, arguments, auto_run,
            repo_watched, branch_watched, created_at, scheduled_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(id)
    .bind(&req.name)
    .bind(PipelineStatus::Idle.as_str())
    .bind(req.project_id)
    .bind(&req.arguments)
    .bind(req.auto_run)
    .bind(&req.repo_watched)
    .bind(&req.branch_watched)
    .bind(now)
    .bind(req.scheduled_at)
    .execute(pool)
    .await?;

    Ok(Pipeline {
        id,
        name: req.name,
        status: PipelineStatus::Idle,
        project_id: req.project_id,
        arguments: req.arguments,
        auto_run: req.auto_run,
        repo_watched: req.repo_watched,
        branch_watched: req.branch_watched,
        tasks: Vec::new(),
        created_at: now,
        updated_at: None,
        executed_at: None,
        stopped_at: None,
        scheduled_at: req.scheduled_at,
    })
}

/// Find a pipeline by ID or name, without its tasks
pub async fn find(pool: &PgPool, lookup: &PipelineLookup) -> Result<Option<PipelineRow>, sqlx::Error> {
    let row = match lookup {
        PipelineLookup::Id(id) => {
            sqlx::query_as::<_, PipelineRow>(&format!(
                "SELECT {PIPELINE_COLUMNS} FROM pipelines WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(pool)
            .await?
        }
        PipelineLookup::Name(name) => {
            sqlx::query_as::<_, PipelineRow>(&format!(
                "SELECT {PIPELINE_COLUMNS} FROM pipelines WHERE name = $1 ORDER BY created_at LIMIT 1"
            ))
            .bind(name)
            .fetch_optional(pool)
            .await?
        }
    };

    Ok(row)
}

/// List pipelines matching the query, most recently executed first
pub async fn list(pool: &PgPool, query: &PipelineQuery) -> Result<Vec<PipelineRow>, sqlx::Error> {
    sqlx::query_as::<_, PipelineRow>(&format!(
        r#"
        SELECT {PIPELINE_COLUMNS}
        FROM pipelines
        WHERE ($1::uuid IS NULL OR project_id = $1)
          AND ($2::text IS NULL OR repo_watched = $2)
          AND ($3::text IS NULL OR branch_watched = $3)
          AND ($4::boolean IS NULL OR auto_run = $4)
        ORDER BY executed_at DESC NULLS LAST
        "#
    ))
    .bind(query.project_id)
    .bind(&query.repo_watched)
    .bind(&query.branch_watched)
    .bind(query.auto_run)
    .fetch_all(pool)
    .await
}

/// Apply a partial update; absent fields keep their stored value
pub async fn update(pool: &PgPool, id: Uuid, req: UpdatePipeline) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipelines
        SET name = COALESCE($1, name),
            scheduled_at = COALESCE($2, scheduled_at),
            auto_run = COALESCE($3, auto_run),
            arguments = COALESCE($4, arguments),
            repo_watched = COALESCE($5, repo_watched),
            branch_watched = COALESCE($6, branch_watched),
            updated_at = $7
        WHERE id = $8
        "#,
    )
    .bind(&req.name)
    .bind(req.scheduled_at)
    .bind(req.auto_run)
    .bind(&req.arguments)
    .bind(&req.repo_watched)
    .bind(&req.branch_watched)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Set the aggregate status in a single statement
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: PipelineStatus,
    stamp: ClockStamp,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipelines
        SET status = $1,
            executed_at = CASE WHEN $2::text = 'started' THEN $3 ELSE executed_at END,
            stopped_at = CASE
                WHEN $2::text = 'started' THEN NULL
                WHEN $2::text = 'stopped' THEN $3
                ELSE stopped_at
            END
        WHERE id = $4
        "#,
    )
    .bind(status.as_str())
    .bind(stamp_mode(stamp))
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a pipeline; its tasks go with it
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pipelines WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
pub struct PipelineRow {
    pub id: Uuid,
    name: String,
    status: String,
    project_id: Option<Uuid>,
    arguments: Vec<String>,
    auto_run: bool,
    repo_watched: Option<String>,
    branch_watched: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    executed_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    scheduled_at: Option<DateTime<Utc>>,
}

impl PipelineRow {
    /// Map the row onto the domain type, attaching the already-loaded tasks
    pub fn into_pipeline(
        self,
        tasks: Vec<deploybot_core::domain::task::Task>,
    ) -> Result<Pipeline, GatewayError> {
        let status = self
            .status
            .parse::<PipelineStatus>()
            .map_err(|e| GatewayError::InvalidRecord(format!("pipeline {}: {}", self.id, e)))?;

        Ok(Pipeline {
            id: self.id,
            name: self.name,
            status,
            project_id: self.project_id,
            arguments: self.arguments,
            auto_run: self.auto_run,
            repo_watched: self.repo_watched,
            branch_watched: self.branch_watched,
            tasks,
            created_at: self.created_at,
            updated_at: self.updated_at,
            executed_at: self.executed_at,
            stopped_at: self.stopped_at,
            scheduled_at: self.scheduled_at,
        })
    }
}
