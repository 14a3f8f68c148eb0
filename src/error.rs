//! Error types for the command-line front end

use rtflash_imxrt::BootSource;
use thiserror::Error;

/// Front-end errors
#[derive(Debug, Error)]
pub enum CliError {
    /// The target string is malformed
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidFormat(String),

    /// A target parameter was given twice
    #[error("Parameter given more than once: {0}")]
    DuplicateParameter(String),

    /// A target parameter has a bad value
    #[error("Invalid value for {key}: {value}")]
    InvalidParameter {
        /// Parameter name
        key: String,
        /// Value as given
        value: String,
    },

    /// No target of that name
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// No driver claimed the attached part
    #[error("No driver for part 0x{part_id:03X}")]
    NotClaimed {
        /// Part identity reported by the target
        part_id: u16,
    },

    /// The part does not boot from serial flash
    #[error("Target boots from {0}, no serial flash to access")]
    NoSerialFlash(BootSource),

    /// The flash chip was not identified
    #[error("No flash region registered (flash identification failed)")]
    NoFlash,
}
