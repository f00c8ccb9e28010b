//! API Module
//!
//! HTTP API layer for the deployment pipeline service.
//! Each submodule handles endpoints for a specific domain.

pub mod auth;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod task;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cascade::Cascade;
use crate::repository::PipelineGateway;
use auth::JwtState;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn PipelineGateway>,
    pub cascade: Cascade,
    pub jwt: Arc<JwtState>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Pipeline endpoints
        .route("/pipelines", get(pipeline::list_pipelines))
        .route(
            "/pipeline",
            get(pipeline::get_pipeline).post(pipeline::create_pipeline),
        )
        .route(
            "/pipeline/{id}",
            patch(pipeline::update_pipeline).delete(pipeline::delete_pipeline),
        )
        .route("/pipeline/{id}/status", put(pipeline::update_pipeline_status))
        // Task endpoints
        .route("/pipeline/{pipeline_id}/task", post(task::create_task))
        .route(
            "/pipeline/{pipeline_id}/task/{task_id}",
            get(task::get_task)
                .patch(task::update_task)
                .delete(task::delete_task),
        )
        .route(
            "/pipeline/{pipeline_id}/task/{task_id}/status",
            put(task::update_task_status),
        )
        // Add state and middleware
        .layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth::auth_middleware,
        ))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
