//! Pipeline DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pipeline::Pipeline;

/// Request to create a new pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipeline {
    pub name: String,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub auto_run: bool,
    #[serde(default)]
    pub repo_watched: Option<String>,
    #[serde(default)]
    pub branch_watched: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Partial update of a pipeline; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePipeline {
    pub name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub auto_run: Option<bool>,
    pub arguments: Option<Vec<String>>,
    pub repo_watched: Option<String>,
    pub branch_watched: Option<String>,
}

/// Filters for listing pipelines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineQuery {
    pub project_id: Option<Uuid>,
    pub repo_watched: Option<String>,
    pub branch_watched: Option<String>,
    pub auto_run: Option<bool>,
}

impl PipelineQuery {
    pub fn matches(&self, pipeline: &Pipeline) -> bool {
        self.project_id.is_none_or(|id| pipeline.project_id == Some(id))
            && self
                .repo_watched
                .as_ref()
                .is_none_or(|repo| pipeline.repo_watched.as_ref() == Some(repo))
            && self
                .branch_watched
                .as_ref()
                .is_none_or(|branch| pipeline.branch_watched.as_ref() == Some(branch))
            && self.auto_run.is_none_or(|auto| pipeline.auto_run == auto)
    }
}

/// How a single pipeline is looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineLookup {
    Id(Uuid),
    Name(String),
}

impl std::fmt::Display for PipelineLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineLookup::Id(id) => write!(f, "{}", id),
            PipelineLookup::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// Listing response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineList {
    pub items: Vec<Pipeline>,
    pub total_count: usize,
}

impl From<Vec<Pipeline>> for PipelineList {
    fn from(items: Vec<Pipeline>) -> Self {
        PipelineList {
            total_count: items.len(),
            items,
        }
    }
}
