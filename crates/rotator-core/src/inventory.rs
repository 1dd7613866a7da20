//! Target discovery: find the one live host carrying the control-plane label.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, RotatorError};
use crate::types::{Instance, LifecycleState};

/// Label plus liveness filter passed to the inventory API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceFilter {
    pub label_key: String,
    pub label_value: String,
    pub state: LifecycleState,
}

/// Fleet inventory. Implementations report transport failures as
/// [`RotatorError::InventoryApi`].
pub trait Inventory {
    fn find_instances(&self, filter: &InstanceFilter) -> Result<Vec<Instance>>;
}

pub struct InstanceLocator<'a> {
    inventory: &'a dyn Inventory,
}

impl<'a> InstanceLocator<'a> {
    pub fn new(inventory: &'a dyn Inventory) -> Self {
        Self { inventory }
    }

    /// Returns the first running instance in inventory order.
    ///
    /// No tie-break is applied when several hosts share the label; the
    /// deployment is expected to run a single control plane.
    pub fn locate(&self, label_key: &str, label_value: &str) -> Result<Instance> {
        let filter = InstanceFilter {
            label_key: label_key.to_string(),
            label_value: label_value.to_string(),
            state: LifecycleState::Running,
        };
        let candidates = self.inventory.find_instances(&filter)?;
        debug!(matches = candidates.len(), "inventory query returned");

        let instance = candidates
            .into_iter()
            .find(Instance::is_running)
            .ok_or_else(|| RotatorError::NotFound {
                label_key: label_key.to_string(),
                label_value: label_value.to_string(),
            })?;

        info!(instance_id = %instance.id, "found control plane instance");
        Ok(instance)
    }
}
