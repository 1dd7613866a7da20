pub mod locate;
pub mod run;
pub mod validate;

use anyhow::Context;
use rotator_core::config::{Config, WarnLevel};
use std::path::Path;

/// Load the config file, or the built-in defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load(p)
            .with_context(|| format!("failed to load config from {}", p.display())),
        None => Ok(Config::default()),
    }
}

/// Refuse to touch remote state with a config that has Error-level findings.
pub fn ensure_valid(config: &Config) -> anyhow::Result<()> {
    let errors: Vec<String> = config
        .validate()
        .into_iter()
        .filter(|w| w.level == WarnLevel::Error)
        .map(|w| w.message)
        .collect();
    if !errors.is_empty() {
        anyhow::bail!("invalid config: {}", errors.join("; "));
    }
    Ok(())
}
