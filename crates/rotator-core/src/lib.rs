pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod inventory;
pub mod rotation;
pub mod ssm;
pub mod store;
pub mod trigger;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{Result, RotatorError};
