//! Remote command execution: dispatch once, then poll the status API until a
//! terminal status, a status-call failure, or the attempt budget runs out.
//!
//! ```text
//!   dispatch ──▶ sleep ──▶ status ──┬─ Success ─────────────▶ Ok(stdout)
//!                  ▲                ├─ Failed/Cancelled/
//!                  │                │  TimedOut ────────────▶ CommandExecution
//!                  └── Pending/ ◀───┘
//!                      InProgress   (attempts exhausted) ───▶ PollTimeout
//! ```

use std::time::Duration;

use tracing::{info, warn};

use crate::clock::Sleeper;
use crate::error::{Result, RotatorError};
use crate::types::{CommandInvocation, InvocationStatus};

/// Substituted for an empty stderr on a failed invocation.
pub const UNKNOWN_ERROR: &str = "Unknown error";

// ---------------------------------------------------------------------------
// CommandApi
// ---------------------------------------------------------------------------

/// Remote execution API.
///
/// `dispatch` failures are reported as [`RotatorError::Dispatch`] and
/// `status` failures as [`RotatorError::ExecutionApi`].
pub trait CommandApi {
    /// Submit `command` to `instance_id`, returning the invocation id.
    fn dispatch(&self, instance_id: &str, command: &str) -> Result<String>;

    fn status(&self, invocation_id: &str, instance_id: &str) -> Result<CommandInvocation>;
}

// ---------------------------------------------------------------------------
// PollPolicy
// ---------------------------------------------------------------------------

/// How patient the executor is. This bounds the caller's wait, not the
/// remote side's own command timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Upper bound on time spent sleeping in one `execute` call.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

// ---------------------------------------------------------------------------
// RemoteCommandExecutor
// ---------------------------------------------------------------------------

pub struct RemoteCommandExecutor<'a> {
    api: &'a dyn CommandApi,
    sleeper: &'a dyn Sleeper,
}

impl<'a> RemoteCommandExecutor<'a> {
    pub fn new(api: &'a dyn CommandApi, sleeper: &'a dyn Sleeper) -> Self {
        Self { api, sleeper }
    }

    /// Run `command` on `instance_id` and return its trimmed stdout.
    ///
    /// Issues at most `policy.max_attempts` status checks and never polls
    /// again after a terminal status. Neither dispatch nor status calls are
    /// retried.
    pub fn execute(&self, instance_id: &str, command: &str, policy: PollPolicy) -> Result<String> {
        let invocation_id = self.api.dispatch(instance_id, command)?;
        info!(%instance_id, %invocation_id, "command dispatched");

        for attempt in 1..=policy.max_attempts {
            self.sleeper.sleep(policy.interval);

            let invocation = self.api.status(&invocation_id, instance_id)?;
            match invocation.status {
                InvocationStatus::Success => {
                    return Ok(invocation.standard_output.trim().to_string());
                }
                status @ (InvocationStatus::Failed
                | InvocationStatus::Cancelled
                | InvocationStatus::TimedOut) => {
                    let stderr = match invocation.standard_error.trim() {
                        "" => UNKNOWN_ERROR.to_string(),
                        s => s.to_string(),
                    };
                    warn!(%invocation_id, %status, "command reached a failed terminal status");
                    return Err(RotatorError::CommandExecution { status, stderr });
                }
                InvocationStatus::Pending | InvocationStatus::InProgress => {
                    info!(
                        %invocation_id,
                        status = %invocation.status,
                        "waiting for command completion... attempt {attempt}/{}",
                        policy.max_attempts
                    );
                }
            }
        }

        Err(RotatorError::PollTimeout {
            invocation_id,
            attempts: policy.max_attempts,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
