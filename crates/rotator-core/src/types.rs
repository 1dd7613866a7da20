use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, RotatorError};

/// Tokens shorter than this are treated as truncated command output.
pub const MIN_SECRET_LEN: usize = 20;

/// Number of leading characters of a token that may appear in logs.
pub const SECRET_PREFIX_LEN: usize = 6;

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Running,
    Stopped,
    Terminated,
    Unknown,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Terminated => "terminated",
            LifecycleState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub lifecycle_state: LifecycleState,
}

impl Instance {
    pub fn is_running(&self) -> bool {
        self.lifecycle_state == LifecycleState::Running
    }
}

// ---------------------------------------------------------------------------
// InvocationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvocationStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Cancelled,
    TimedOut,
}

impl InvocationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InvocationStatus::Success
                | InvocationStatus::Failed
                | InvocationStatus::Cancelled
                | InvocationStatus::TimedOut
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvocationStatus::Pending => "Pending",
            InvocationStatus::InProgress => "InProgress",
            InvocationStatus::Success => "Success",
            InvocationStatus::Failed => "Failed",
            InvocationStatus::Cancelled => "Cancelled",
            InvocationStatus::TimedOut => "TimedOut",
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvocationStatus {
    type Err = RotatorError;

    /// Accepts every status the SSM API reports. `Delayed` is a retryable
    /// delivery state and `Cancelling` has not settled yet, so both fold into
    /// the non-terminal variants.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" | "Delayed" => Ok(InvocationStatus::Pending),
            "InProgress" | "Cancelling" => Ok(InvocationStatus::InProgress),
            "Success" => Ok(InvocationStatus::Success),
            "Failed" => Ok(InvocationStatus::Failed),
            "Cancelled" => Ok(InvocationStatus::Cancelled),
            "TimedOut" => Ok(InvocationStatus::TimedOut),
            other => Err(RotatorError::ExecutionApi(format!(
                "unrecognized invocation status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// CommandInvocation
// ---------------------------------------------------------------------------

/// A snapshot of one dispatched command as reported by the status API.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInvocation {
    pub invocation_id: String,
    pub status: InvocationStatus,
    pub standard_output: String,
    pub standard_error: String,
}

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A validated join token.
///
/// The full value is only reachable through [`Secret::expose`]; `Debug`
/// prints the prefix and length.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    value: String,
}

impl Secret {
    /// Shape check on raw command output. This catches truncated or garbled
    /// output; it says nothing about token strength.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let value = raw.into();
        let len = value.chars().count();
        if value.is_empty() {
            return Err(RotatorError::Validation("command produced no output".into()));
        }
        if len < MIN_SECRET_LEN {
            return Err(RotatorError::Validation(format!(
                "expected at least {MIN_SECRET_LEN} characters, got {len} (prefix '{}')",
                prefix_of(&value)
            )));
        }
        Ok(Self { value })
    }

    pub fn prefix(&self) -> String {
        prefix_of(&self.value)
    }

    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("prefix", &self.prefix())
            .field("len", &self.len())
            .finish()
    }
}

fn prefix_of(value: &str) -> String {
    value.chars().take(SECRET_PREFIX_LEN).collect()
}

// ---------------------------------------------------------------------------
// RotationResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationResult {
    pub status_code: u16,
    pub message: String,
    pub secret_prefix: String,
    pub instance_id: String,
    /// Active token count reported by the diagnostic step, if it succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_secrets: Option<u64>,
    pub rotated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(InvocationStatus::Success.is_terminal());
        assert!(InvocationStatus::Failed.is_terminal());
        assert!(InvocationStatus::Cancelled.is_terminal());
        assert!(InvocationStatus::TimedOut.is_terminal());
        assert!(!InvocationStatus::Pending.is_terminal());
        assert!(!InvocationStatus::InProgress.is_terminal());
    }

    #[test]
    fn ssm_only_statuses_fold_into_non_terminal() {
        assert_eq!(
            "Delayed".parse::<InvocationStatus>().unwrap(),
            InvocationStatus::Pending
        );
        assert_eq!(
            "Cancelling".parse::<InvocationStatus>().unwrap(),
            InvocationStatus::InProgress
        );
    }

    #[test]
    fn unknown_status_is_an_api_error() {
        let err = "Exploded".parse::<InvocationStatus>().unwrap_err();
        assert!(matches!(err, RotatorError::ExecutionApi(_)));
        assert!(err.to_string().contains("Exploded"));
    }

    #[test]
    fn secret_accepts_kubeadm_shaped_token() {
        let s = Secret::parse("abcdef.0123456789abcdef").unwrap();
        assert_eq!(s.prefix(), "abcdef");
        assert_eq!(s.len(), 23);
        assert_eq!(s.expose(), "abcdef.0123456789abcdef");
    }

    #[test]
    fn secret_boundary_is_twenty_characters() {
        assert!(Secret::parse("a".repeat(20)).is_ok());
        let err = Secret::parse("a".repeat(19)).unwrap_err();
        assert!(matches!(err, RotatorError::Validation(_)));
    }

    #[test]
    fn secret_rejects_empty_output() {
        let err = Secret::parse("").unwrap_err();
        assert!(err.to_string().contains("no output"));
    }

    #[test]
    fn short_secret_error_does_not_echo_the_value() {
        let err = Secret::parse("short-but-secret").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("got 16"));
        assert!(msg.contains("'short-'"));
        assert!(!msg.contains("short-but-secret"));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let s = Secret::parse("a1b2c3d4e5f6g7h8i9j0.secretpart").unwrap();
        let dbg = format!("{s:?}");
        assert!(dbg.contains("a1b2c3"));
        assert!(!dbg.contains("secretpart"));
    }

    #[test]
    fn instance_running_predicate() {
        let mut inst = Instance {
            id: "i-abc".to_string(),
            tags: HashMap::new(),
            lifecycle_state: LifecycleState::Running,
        };
        assert!(inst.is_running());
        inst.lifecycle_state = LifecycleState::Stopped;
        assert!(!inst.is_running());
    }
}
