//! Quadra CLI - Command-line driver for the quadratic voting engine.
//!
//! Keeps engine state in a JSON file between invocations and passes the
//! current time into the engine explicitly.

pub mod commands;
pub mod config;
pub mod output;
pub mod store;
pub mod telemetry;

use clap::Parser;

use crate::config::QuadraConfig;

fn main() {
    let cli = commands::Cli::parse();

    if let Err(e) = run(cli) {
        output::print_error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: commands::Cli) -> anyhow::Result<()> {
    let mut config = QuadraConfig::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    telemetry::init_telemetry(&config.logging)?;

    tracing::debug!(command = ?cli.command, "running command");
    commands::execute(cli, &config)
}
