//! rtflash-core - Core library for debug-probe driven flash access
//!
//! This crate holds the pieces shared between target drivers and the
//! front end that drives them: the debug transport abstraction, the target
//! handle drivers register their memory map with, SPI flash command
//! descriptors and the error type. It is `no_std` compatible (with `alloc`).
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`Error`]
//!
//! # Example
//!
//! ```ignore
//! use rtflash_core::{memory::MemoryAccess, target::Target};
//!
//! fn attach<M: MemoryAccess>(mem: M, part_id: u16) -> Target<M> {
//!     let target = Target::new(mem, part_id);
//!     log::info!("attached to part {:#05x}", target.part_id());
//!     target
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod flash;
pub mod memory;
pub mod progress;
pub mod sfdp;
pub mod spi;
pub mod target;

pub use error::{Error, Result};
