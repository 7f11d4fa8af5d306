//! Client library for Google SecOps (Chronicle)
//!
//! - [`chronicle`] - API client, pagination and resource operations
//! - [`config`] - Persistent CLI configuration
//! - [`cli`] - Command definitions and handlers for the `secops` binary
//! - [`error`] - Error types

pub mod chronicle;
pub mod cli;
pub mod config;
pub mod error;

pub use error::{Result, SecOpsError};
