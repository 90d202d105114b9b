//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line client for the M4300 admin API
#[derive(Parser, Debug)]
#[command(name = "m4300ctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Switch configuration file (YAML); defaults to M4300_* environment variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and print the token with its expiry
    Login,

    /// Show hardware details, status and sensor readings
    DeviceInfo,

    /// VLAN configuration
    Vlan {
        #[command(subcommand)]
        action: VlanAction,
    },

    /// Send an arbitrary API call
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// Endpoint below /api/v1, e.g. `device_info` or `config?type=network`
        endpoint: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        /// Reuse this token instead of logging in; a replacement is printed if it had to be renewed
        #[arg(long)]
        token: Option<String>,
    },

    /// Invalidate a session on the device
    ///
    /// With `--token`, that session is closed. Without it, a new session is
    /// opened and closed again, which only checks that logout works.
    Logout {
        /// Token of the session to close
        #[arg(long)]
        token: Option<String>,
    },
}

/// VLAN subcommands
#[derive(Subcommand, Debug)]
pub enum VlanAction {
    /// Show one VLAN
    Get {
        /// VLAN ID
        id: u16,
    },

    /// Create or rename a VLAN
    Set {
        /// VLAN ID
        id: u16,

        /// VLAN name
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete one VLAN
    Delete {
        /// VLAN ID
        id: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}
