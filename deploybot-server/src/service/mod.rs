//! Service Module
//!
//! Business logic layer for the server.
//! Services validate input, call the persistence gateway and map missing
//! records onto domain errors.

pub mod pipeline;
pub mod task;

// Re-export for convenience
pub use pipeline as pipeline_service;
pub use task as task_service;
