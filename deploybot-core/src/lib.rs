//! Deploybot Core
//!
//! Core types shared by the Deploybot services.
//!
//! This crate contains:
//! - Domain types: Pipelines, their embedded tasks and status enums
//! - DTOs: Request bodies, query filters and the stream-webhook payload

pub mod domain;
pub mod dto;
