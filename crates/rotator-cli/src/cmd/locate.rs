use crate::output::{print_json, print_table};
use anyhow::Context;
use rotator_core::config::Config;
use rotator_core::inventory::InstanceLocator;
use rotator_core::ssm::{SsmClient, SsmInventory};

pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let client = SsmClient::from_config(&config.ssm).context("failed to configure SSM client")?;
    let inventory = SsmInventory::new(client);
    let target = &config.target;

    let instance = InstanceLocator::new(&inventory)
        .locate(&target.label_key, &target.label_value)
        .context("failed to locate control plane")?;

    if json {
        print_json(&instance)?;
    } else {
        print_table(
            &["INSTANCE", "STATE", "LABEL"],
            vec![vec![
                instance.id.clone(),
                instance.lifecycle_state.to_string(),
                format!("{}={}", target.label_key, target.label_value),
            ]],
        );
    }

    Ok(())
}
