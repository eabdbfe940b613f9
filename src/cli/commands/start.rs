//! Start command - launches the gateway.

use crate::cli::args::{CheckArgs, StartArgs};
use crate::core::config::Config;
use crate::core::runtime::Runtime;
use crate::telemetry;
use anyhow::Result;

pub async fn run_start(args: StartArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    telemetry::init_tracing(&config.log_level)?;
    let runtime = Runtime::new(config)?;
    runtime.run().await
}

/// Validate the configuration file and report the outcome.
pub fn run_check(args: CheckArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    println!(
        "configuration ok: {} subscriptions max, events on {}:{}",
        config.sse.subscription_limit, config.sse.events_addr, config.sse.events_port
    );
    Ok(())
}
