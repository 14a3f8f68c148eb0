//! rtflash - i.MXRT10xx boot flash access through a debug transport
//!
//! Attaches to a target, lets the i.MXRT10xx driver probe it and then talks
//! to the external serial flash behind FlexSPI1 using IP commands.
//!
//! # Architecture
//!
//! - `rtflash-core` - Target model, memory access trait and flash descriptors
//! - `rtflash-imxrt` - The i.MXRT10xx driver: boot decoding, FlexSPI1
//!   takeover and restore, LUT sequences and the flash hooks
//! - `rtflash-sim` - A simulated i.MXRT10xx used as the default transport

mod cli;
mod commands;
mod error;
mod targets;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let command_timeout = cli.command_timeout_ms.map(Duration::from_millis);
    let erase_timeout = cli.erase_timeout_s.map(Duration::from_secs);
    let attach = |target: &str| {
        commands::attach(target, |mut options| {
            if let Some(timeout) = command_timeout {
                options = options.with_command_timeout(timeout);
            }
            if let Some(timeout) = erase_timeout {
                options = options.with_erase_timeout(timeout);
            }
            options
        })
    };

    match cli.command {
        Commands::Probe { target } => commands::run_probe(&attach(&target)?),
        Commands::Id { target } => commands::run_id(&mut attach(&target)?),
        Commands::Status { target } => commands::run_status(&mut attach(&target)?),
        Commands::Sfdp {
            target,
            address,
            length,
        } => commands::run_sfdp(&mut attach(&target)?, address, length),
        Commands::Erase { target } => commands::run_erase(&mut attach(&target)?),
        Commands::ListTargets => {
            commands::list_targets();
            Ok(())
        }
    }
}
