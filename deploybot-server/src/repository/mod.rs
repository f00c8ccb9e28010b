//! Repository Module
//!
//! Data access layer for the server.
//! `pipeline` and `task` hold the PostgreSQL queries; `gateway` wraps them
//! behind the `PipelineGateway` trait alongside an in-memory implementation.

pub mod gateway;
pub mod memory;
pub mod pipeline;
pub mod task;

// Re-export for convenience
pub use gateway::{GatewayError, GatewayResult, PgPipelineGateway, PipelineGateway};
pub use memory::InMemoryPipelineGateway;
pub use pipeline as pipeline_repository;
pub use task as task_repository;
