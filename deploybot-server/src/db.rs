use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create pipelines table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipelines (
            id UUID PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            status VARCHAR(20) NOT NULL,
            project_id UUID,
            arguments TEXT[] NOT NULL DEFAULT '{}',
            auto_run BOOLEAN NOT NULL DEFAULT FALSE,
            repo_watched TEXT,
            branch_watched TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ,
            executed_at TIMESTAMPTZ,
            stopped_at TIMESTAMPTZ,
            scheduled_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Tasks are embedded in their pipeline: keyed by (pipeline_id, id) and
    // removed together with it
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            pipeline_id UUID NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
            id UUID NOT NULL,
            position BIGSERIAL,
            name VARCHAR(255) NOT NULL,
            status VARCHAR(20) NOT NULL,
            upstream_task_id UUID,
            auto_run BOOLEAN NOT NULL DEFAULT FALSE,
            stream_webhook TEXT,
            config JSONB,
            remarks TEXT,
            timeout_seconds BIGINT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ,
            executed_at TIMESTAMPTZ,
            stopped_at TIMESTAMPTZ,
            scheduled_at TIMESTAMPTZ,
            PRIMARY KEY (pipeline_id, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pipelines_project_id ON pipelines(project_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pipelines_name ON pipelines(name)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_pipelines_executed_at ON pipelines(executed_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tasks_upstream ON tasks(pipeline_id, upstream_task_id)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
