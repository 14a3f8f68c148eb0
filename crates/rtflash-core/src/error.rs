//! Error types for rtflash-core
//!
//! This module provides a no_std compatible error type that is shared by the
//! transport, the target drivers and the front end.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// The debug transport failed to complete a memory access
    MemoryAccess {
        /// Address of the failed access
        addr: u32,
    },
    /// The transport requires aligned addresses or whole-word lengths
    InvalidAlignment,

    // Flash controller errors
    /// A single controller transfer was asked to move more than the FIFO holds
    TransferTooLarge {
        /// Number of bytes requested
        requested: usize,
        /// Largest transfer the controller supports
        max: usize,
    },
    /// An instruction sequence needed more slots than the controller provides
    SequenceOverflow,
    /// An opt-in deadline expired while waiting on the controller or flash
    Timeout,
    /// A flash-mode exit was requested without a matching entry
    NotInFlashMode,

    // Flash chip errors
    /// Write enable was issued but the flash did not latch it
    WriteEnableFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemoryAccess { addr } => {
                write!(f, "memory access failed at address 0x{:08X}", addr)
            }
            Self::InvalidAlignment => write!(f, "invalid alignment"),
            Self::TransferTooLarge { requested, max } => write!(
                f,
                "transfer of {} bytes exceeds controller limit of {} bytes",
                requested, max
            ),
            Self::SequenceOverflow => write!(f, "instruction sequence does not fit the LUT"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::NotInFlashMode => write!(f, "target is not in flash mode"),
            Self::WriteEnableFailed => write!(f, "flash did not latch write enable"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
