//! CLI entry point for ampgate.

pub mod auth;

use clap::{Parser, Subcommand};

/// Ampgate CLI
#[derive(Parser, Debug)]
#[command(
    name = "ampgate",
    version,
    about = "Activity-driven power gate for an amplified audio rig"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitoring loop in the foreground
    Run(RunArgs),
    /// Show rig power state and credential health
    Status,
    /// Spotify authorization management
    Auth(AuthArgs),
    /// Drive the plugs directly, bypassing the monitor
    Switch(SwitchArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Idle minutes before shutoff (overrides AMPGATE_IDLE_MINUTES)
    #[arg(long)]
    pub idle_minutes: Option<u64>,

    /// Seconds between activity polls (overrides AMPGATE_TICK_SECONDS)
    #[arg(long)]
    pub tick_seconds: Option<u64>,
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Authorize with Spotify and store the credential
    Login,
    /// Show stored credential status
    Status,
    /// Remove the stored credential
    Logout,
}

/// Arguments for the `switch` subcommand group.
#[derive(Parser, Debug)]
pub struct SwitchArgs {
    #[command(subcommand)]
    pub command: SwitchCommands,
}

/// Manual plug control.
#[derive(Subcommand, Debug)]
pub enum SwitchCommands {
    /// Power the rig on (mixer first, then speakers)
    On,
    /// Power the rig off (speakers first, then mixer)
    Off,
    /// Flip the rig to the opposite state
    Toggle,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
