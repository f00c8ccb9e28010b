//! Stream webhook notification
//!
//! Body posted to a downstream task's stream webhook when its upstream task
//! completes:
//!
//! ```json
//! {"payload": {"pipelineId": "...", "taskId": "...", "arguments": ["env=prod"]}}
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamWebhook {
    pub payload: StreamWebhookPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamWebhookPayload {
    pub pipeline_id: Uuid,
    pub task_id: Uuid,
    pub arguments: Vec<String>,
}

impl StreamWebhook {
    pub fn new(pipeline_id: Uuid, task_id: Uuid, arguments: Vec<String>) -> Self {
        StreamWebhook {
            payload: StreamWebhookPayload {
                pipeline_id,
                task_id,
                arguments,
            },
        }
    }
}
