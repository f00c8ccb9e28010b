//! Data Transfer Objects
//!
//! Request bodies, query filters and response shapes exchanged over the
//! HTTP API, plus the notification body posted to stream webhooks.

pub mod pipeline;
pub mod task;
pub mod webhook;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response carrying the identity of a freshly created record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

/// Body of the status endpoints
///
/// The status is kept as a raw string so that unknown values surface as a
/// validation error instead of a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}
