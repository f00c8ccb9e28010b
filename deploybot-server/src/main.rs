use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod cascade;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod transport;

#[cfg(test)]
mod testing;

use api::AppState;
use api::auth::JwtState;
use cascade::Cascade;
use config::{Config, StorageBackend};
use repository::{InMemoryPipelineGateway, PgPipelineGateway, PipelineGateway};
use transport::WebhookTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deploybot_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting deploybot server...");

    let config = Config::from_env()?;
    config.validate()?;

    let gateway: Arc<dyn PipelineGateway> = match config.storage {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(&config.database_url)
                .await
                .context("Failed to create database pool")?;

            tracing::info!("Database connection pool created");

            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Arc::new(PgPipelineGateway::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; pipelines are lost on restart");
            Arc::new(InMemoryPipelineGateway::new())
        }
    };

    let transport = WebhookTransport::new(config.webhook_timeout)
        .context("Failed to build webhook client")?;

    let state = AppState {
        cascade: Cascade::new(gateway.clone(), Arc::new(transport)),
        gateway,
        jwt: Arc::new(JwtState::new(&config.token_secret)),
    };

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
