use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::types::Secret;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    String,
    SecureString,
}

impl ParameterType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterType::String => "String",
            ParameterType::SecureString => "SecureString",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One write to the parameter store.
#[derive(Debug, Clone, PartialEq)]
pub struct PutParameter {
    pub name: String,
    pub value: Secret,
    pub parameter_type: ParameterType,
    pub overwrite: bool,
    pub description: String,
}

impl PutParameter {
    /// An overwriting SecureString write, the only kind the rotation issues.
    pub fn secure(name: impl Into<String>, value: Secret, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            parameter_type: ParameterType::SecureString,
            overwrite: true,
            description: description.into(),
        }
    }
}

/// Shared parameter store. Failures are reported as
/// [`crate::RotatorError::Publish`]; the returned value is the new parameter
/// version.
pub trait ParameterStore {
    fn put_parameter(&self, request: &PutParameter) -> Result<u64>;
}
