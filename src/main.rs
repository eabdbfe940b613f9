#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

//! Fanout - unified CLI entrypoint.
//!
//! Usage:
//!   fanout start --config config/fanout.toml
//!   fanout check --config config/fanout.toml

use anyhow::Result;
use clap::Parser;
use fanout::cli::commands::{run_check, run_start};
use fanout::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start(args) => run_start(args).await,
        Commands::Check(args) => run_check(args),
    }
}
