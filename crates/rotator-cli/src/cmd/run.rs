use crate::output::print_json;
use anyhow::Context;
use rotator_core::clock::ThreadSleeper;
use rotator_core::config::Config;
use rotator_core::rotation::RotationController;
use rotator_core::ssm::{SsmClient, SsmCommandApi, SsmInventory, SsmParameterStore};
use rotator_core::trigger;

pub fn run(config: &Config) -> anyhow::Result<()> {
    super::ensure_valid(config)?;

    let client = SsmClient::from_config(&config.ssm).context("failed to configure SSM client")?;
    let inventory = SsmInventory::new(client.clone());
    let commands = SsmCommandApi::from_config(client.clone(), config);
    let store = SsmParameterStore::new(client);
    let sleeper = ThreadSleeper;

    let controller = RotationController::new(config, &inventory, &commands, &store, &sleeper);
    let response = trigger::handle(&controller).context("token refresh failed")?;
    print_json(&response)
}
