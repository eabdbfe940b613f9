//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Fanout - topic fan-out SSE gateway.
#[derive(Parser)]
#[command(name = "fanout")]
#[command(version)]
#[command(about = "Topic fan-out gateway bridging a pub/sub message bus to SSE clients")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway
    Start(StartArgs),

    /// Validate a configuration file and exit
    Check(CheckArgs),
}

#[derive(Args)]
pub struct StartArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/fanout.toml")]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/fanout.toml")]
    pub config: PathBuf,
}
