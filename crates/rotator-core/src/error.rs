use thiserror::Error;

use crate::types::InvocationStatus;

#[derive(Debug, Error)]
pub enum RotatorError {
    #[error("no running instance tagged {label_key}={label_value}")]
    NotFound {
        label_key: String,
        label_value: String,
    },

    #[error("inventory API error: {0}")]
    InventoryApi(String),

    #[error("command dispatch failed: {0}")]
    Dispatch(String),

    #[error("execution API error: {0}")]
    ExecutionApi(String),

    #[error("command failed with status {status}: {stderr}")]
    CommandExecution {
        status: InvocationStatus,
        stderr: String,
    },

    /// The remote side may still finish after this is raised.
    #[error("command {invocation_id} did not complete after {attempts} status checks")]
    PollTimeout { invocation_id: String, attempts: u32 },

    #[error("invalid token received: {0}")]
    Validation(String),

    #[error("failed to publish parameter: {0}")]
    Publish(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RotatorError {
    /// Stable label used as the `kind` field in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RotatorError::NotFound { .. } => "not_found",
            RotatorError::InventoryApi(_) => "inventory_api",
            RotatorError::Dispatch(_) => "dispatch",
            RotatorError::ExecutionApi(_) => "execution_api",
            RotatorError::CommandExecution { .. } => "command_execution",
            RotatorError::PollTimeout { .. } => "poll_timeout",
            RotatorError::Validation(_) => "validation",
            RotatorError::Publish(_) => "publish",
            RotatorError::Config(_) => "config",
            RotatorError::Io(_) => "io",
            RotatorError::Yaml(_) => "yaml",
            RotatorError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, RotatorError>;
