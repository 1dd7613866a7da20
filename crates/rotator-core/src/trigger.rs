//! Scheduler-facing entry point.
//!
//! The scheduler invokes the controller with no payload. Success is reported
//! as `{statusCode, body}` with a JSON-encoded body; failures are logged and
//! handed back unchanged so the scheduler's own alerting sees them.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::Result;
use crate::rotation::RotationController;
use crate::types::RotationResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub status_code: u16,
    /// JSON string: `{"message", "tokenPrefix", "instanceId"}`.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerBody {
    pub message: String,
    pub token_prefix: String,
    pub instance_id: String,
}

impl TriggerResponse {
    pub fn from_result(result: &RotationResult) -> Result<Self> {
        let body = TriggerBody {
            message: result.message.clone(),
            token_prefix: result.secret_prefix.clone(),
            instance_id: result.instance_id.clone(),
        };
        Ok(Self {
            status_code: result.status_code,
            body: serde_json::to_string(&body)?,
        })
    }
}

pub fn handle(controller: &RotationController<'_>) -> Result<TriggerResponse> {
    info!("starting token refresh");
    match controller.rotate() {
        Ok(result) => TriggerResponse::from_result(&result),
        Err(e) => {
            error!(error = %e, kind = e.kind(), "token refresh failed");
            Err(e)
        }
    }
}
