//! CLI argument parsing

use crate::targets;
use clap::{Parser, Subcommand};

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the target argument
fn target_help() -> String {
    format!("Target to attach to [available: {}]", targets::target_names_short())
}

#[derive(Parser)]
#[command(name = "rtflash")]
#[command(author, version, about = "i.MXRT10xx FlexSPI flash access over a debug transport", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Give up on a FlexSPI command after this many milliseconds
    #[arg(long, global = true)]
    pub command_timeout_ms: Option<u64>,

    /// Give up on a chip erase after this many seconds
    #[arg(long, global = true)]
    pub erase_timeout_s: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the target and show its memory map
    Probe {
        /// Target to use
        #[arg(short, long, help = target_help())]
        target: String,
    },

    /// Read the JEDEC ID of the boot flash
    Id {
        /// Target to use
        #[arg(short, long, help = target_help())]
        target: String,
    },

    /// Read status register 1 of the boot flash
    Status {
        /// Target to use
        #[arg(short, long, help = target_help())]
        target: String,
    },

    /// Dump raw SFDP bytes from the boot flash
    Sfdp {
        /// Target to use
        #[arg(short, long, help = target_help())]
        target: String,

        /// SFDP address to start at (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        address: u32,

        /// Number of bytes to read (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32, default_value = "256")]
        length: u32,
    },

    /// Erase the entire boot flash
    Erase {
        /// Target to use
        #[arg(short, long, help = target_help())]
        target: String,
    },

    /// List supported targets
    ListTargets,
}
