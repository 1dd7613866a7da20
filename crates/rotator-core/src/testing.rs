//! In-memory collaborators shared by the unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::clock::Sleeper;
use crate::error::{Result, RotatorError};
use crate::executor::CommandApi;
use crate::inventory::{InstanceFilter, Inventory};
use crate::store::{ParameterStore, PutParameter};
use crate::types::{CommandInvocation, Instance, InvocationStatus, LifecycleState};

pub fn instance(id: &str, state: LifecycleState) -> Instance {
    Instance {
        id: id.to_string(),
        tags: HashMap::from([("Name".to_string(), "kubestock-control-plane".to_string())]),
        lifecycle_state: state,
    }
}

// ---------------------------------------------------------------------------
// FixedInventory
// ---------------------------------------------------------------------------

pub struct FixedInventory {
    instances: Vec<Instance>,
    error: Option<String>,
    filters: RefCell<Vec<InstanceFilter>>,
}

impl FixedInventory {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self {
            instances,
            error: None,
            filters: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            instances: Vec::new(),
            error: Some(message.to_string()),
            filters: RefCell::new(Vec::new()),
        }
    }

    pub fn filters(&self) -> Vec<InstanceFilter> {
        self.filters.borrow().clone()
    }
}

impl Inventory for FixedInventory {
    fn find_instances(&self, filter: &InstanceFilter) -> Result<Vec<Instance>> {
        self.filters.borrow_mut().push(filter.clone());
        match &self.error {
            Some(message) => Err(RotatorError::InventoryApi(message.clone())),
            None => Ok(self.instances.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedCommandApi
// ---------------------------------------------------------------------------

/// Replays a queue of status responses per command text. Each dispatch gets
/// a fresh invocation id bound to the script registered for its command.
#[derive(Default)]
pub struct ScriptedCommandApi {
    scripts: RefCell<HashMap<String, VecDeque<Result<CommandInvocation>>>>,
    invocations: RefCell<HashMap<String, VecDeque<Result<CommandInvocation>>>>,
    dispatched: RefCell<Vec<(String, String)>>,
    dispatch_error: RefCell<Option<String>>,
    status_calls: RefCell<u32>,
}

impl ScriptedCommandApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, command: &str, responses: Vec<Result<CommandInvocation>>) {
        self.scripts
            .borrow_mut()
            .insert(command.to_string(), responses.into());
    }

    pub fn fail_dispatch(&self, message: &str) {
        *self.dispatch_error.borrow_mut() = Some(message.to_string());
    }

    pub fn dispatched(&self) -> Vec<(String, String)> {
        self.dispatched.borrow().clone()
    }

    pub fn status_calls(&self) -> u32 {
        *self.status_calls.borrow()
    }

    pub fn repeat(invocation: CommandInvocation, times: usize) -> Vec<Result<CommandInvocation>> {
        std::iter::repeat_with(|| Ok(invocation.clone()))
            .take(times)
            .collect()
    }

    pub fn pending() -> CommandInvocation {
        Self::with_status(InvocationStatus::Pending, "", "")
    }

    pub fn in_progress() -> CommandInvocation {
        Self::with_status(InvocationStatus::InProgress, "", "")
    }

    pub fn success(stdout: &str) -> CommandInvocation {
        Self::with_status(InvocationStatus::Success, stdout, "")
    }

    pub fn failed(status: InvocationStatus, stderr: &str) -> CommandInvocation {
        Self::with_status(status, "", stderr)
    }

    fn with_status(status: InvocationStatus, stdout: &str, stderr: &str) -> CommandInvocation {
        CommandInvocation {
            // Rewritten with the real id when replayed.
            invocation_id: String::new(),
            status,
            standard_output: stdout.to_string(),
            standard_error: stderr.to_string(),
        }
    }
}

impl CommandApi for ScriptedCommandApi {
    fn dispatch(&self, instance_id: &str, command: &str) -> Result<String> {
        if let Some(message) = self.dispatch_error.borrow().as_ref() {
            return Err(RotatorError::Dispatch(message.clone()));
        }
        self.dispatched
            .borrow_mut()
            .push((instance_id.to_string(), command.to_string()));

        let invocation_id = format!("cmd-{}", self.dispatched.borrow().len());
        let script = self
            .scripts
            .borrow_mut()
            .remove(command)
            .unwrap_or_default();
        self.invocations
            .borrow_mut()
            .insert(invocation_id.clone(), script);
        Ok(invocation_id)
    }

    fn status(&self, invocation_id: &str, _instance_id: &str) -> Result<CommandInvocation> {
        *self.status_calls.borrow_mut() += 1;
        let next = self
            .invocations
            .borrow_mut()
            .get_mut(invocation_id)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(mut invocation)) => {
                invocation.invocation_id = invocation_id.to_string();
                Ok(invocation)
            }
            Some(Err(e)) => Err(e),
            None => Err(RotatorError::ExecutionApi(format!(
                "no scripted response left for {invocation_id}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingStore {
    puts: RefCell<Vec<PutParameter>>,
    error: Option<String>,
}

impl RecordingStore {
    pub fn failing(message: &str) -> Self {
        Self {
            puts: RefCell::new(Vec::new()),
            error: Some(message.to_string()),
        }
    }

    pub fn puts(&self) -> Vec<PutParameter> {
        self.puts.borrow().clone()
    }
}

impl ParameterStore for RecordingStore {
    fn put_parameter(&self, request: &PutParameter) -> Result<u64> {
        self.puts.borrow_mut().push(request.clone());
        match &self.error {
            Some(message) => Err(RotatorError::Publish(message.clone())),
            None => Ok(self.puts.borrow().len() as u64),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSleeper {
    calls: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.calls.borrow_mut().push(duration);
    }
}
