//! End-to-end rotation: locate → create → validate → publish → diagnose.
//!
//! Every run mints a new token and overwrites the stored one, so a scheduler
//! retry is safe but never a no-op. If publishing fails the token already
//! exists on the host; nothing is rolled back.

use chrono::Utc;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::clock::Sleeper;
use crate::config::Config;
use crate::error::Result;
use crate::executor::{CommandApi, RemoteCommandExecutor};
use crate::inventory::{InstanceLocator, Inventory};
use crate::store::{ParameterStore, PutParameter};
use crate::types::{RotationResult, Secret};

pub const SUCCESS_MESSAGE: &str = "Token refreshed successfully";

const PARAMETER_DESCRIPTION: &str = "Kubernetes join token - refreshed by token-rotator";

pub struct RotationController<'a> {
    config: &'a Config,
    inventory: &'a dyn Inventory,
    commands: &'a dyn CommandApi,
    store: &'a dyn ParameterStore,
    sleeper: &'a dyn Sleeper,
}

impl<'a> RotationController<'a> {
    pub fn new(
        config: &'a Config,
        inventory: &'a dyn Inventory,
        commands: &'a dyn CommandApi,
        store: &'a dyn ParameterStore,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            config,
            inventory,
            commands,
            store,
            sleeper,
        }
    }

    /// Run one rotation. The first failing step aborts the run and its error
    /// is returned unchanged; only the diagnostic count is allowed to fail.
    pub fn rotate(&self) -> Result<RotationResult> {
        let span = info_span!("rotation", run_id = %Uuid::new_v4());
        let _guard = span.enter();

        let target = &self.config.target;
        let instance =
            InstanceLocator::new(self.inventory).locate(&target.label_key, &target.label_value)?;

        let executor = RemoteCommandExecutor::new(self.commands, self.sleeper);
        let policy = self.config.poll_policy();

        let raw = executor.execute(&instance.id, &self.config.commands.create, policy)?;
        let secret = Secret::parse(raw)?;
        let prefix = secret.prefix();
        info!(%prefix, "new token created (first 6 chars)");

        let name = self.config.parameter_name();
        let request = PutParameter::secure(&name, secret, PARAMETER_DESCRIPTION);
        let version = self.store.put_parameter(&request)?;
        info!(parameter = %name, version, "parameter updated");

        let active_secrets = self.count_active(&executor, &instance.id);

        Ok(RotationResult {
            status_code: 200,
            message: SUCCESS_MESSAGE.to_string(),
            secret_prefix: prefix,
            instance_id: instance.id,
            active_secrets,
            rotated_at: Utc::now(),
        })
    }

    /// Best-effort count of tokens live on the host. Never fails the run.
    fn count_active(&self, executor: &RemoteCommandExecutor<'_>, instance_id: &str) -> Option<u64> {
        let output = match executor.execute(
            instance_id,
            &self.config.commands.count_active,
            self.config.poll_policy(),
        ) {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "active token count unavailable");
                return None;
            }
        };

        match output.parse::<u64>() {
            Ok(count) => {
                info!(count, "active tokens count");
                Some(count)
            }
            Err(_) => {
                warn!(%output, "active token count is not a number");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
