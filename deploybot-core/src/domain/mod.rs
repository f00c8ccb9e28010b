//! Core domain types
//!
//! A pipeline owns an ordered list of tasks. Tasks are embedded in their
//! pipeline and are only reachable through it.

pub mod pipeline;
pub mod status;
pub mod task;
