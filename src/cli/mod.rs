//! CLI module
//!
//! Command-line interface for one switch.
//!
//! # Commands
//!
//! - `login` - Log in and print the token
//! - `device-info` - Show device information
//! - `vlan get|set|delete` - Manage VLANs
//! - `request` - Send an arbitrary API call
//! - `logout` - Invalidate a session (`--token` for a caller-held one)

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, VlanAction};
pub use runner::Runner;
