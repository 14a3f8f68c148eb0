//! SPI flash command types
//!
//! This module provides the abstract command descriptor consumed by flash
//! controller drivers, its addressing modes and the standard JEDEC opcodes.

mod address;
mod command;
pub mod opcodes;

pub use address::AddressWidth;
pub use command::{Direction, FlashCommand};
pub use opcodes::*;
