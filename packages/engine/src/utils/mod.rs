// packages/engine/src/utils/mod.rs
//! Common utilities: configuration, errors, input validation

pub mod config;
pub mod errors;
pub mod validation;

pub use config::SimConfig;
pub use errors::{Result, SimError};
